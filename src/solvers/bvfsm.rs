use num_traits::Float;

use crate::descent::{descent_step, refine};
use crate::gap::g_gap;
use crate::linalg::dot;
use crate::problem::BilevelProblem;
use crate::trajectory::{Stopwatch, Trajectory};

/// Configuration for the BVFSM solver (value-function smoothing).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BvfsmConfig<F> {
    /// Step size for the follower variable `x` (default: 0.5).
    pub x_lr: F,
    /// Step size for the leader variable `w` (default: 0.5).
    pub w_lr: F,
    /// Step size for the surrogate `z` and the gap probe (default: 0.5).
    pub z_lr: F,
    /// Inner descent steps per outer iteration (default: 10).
    pub k: usize,
    /// Outer iteration budget (default: 500).
    pub max_iter: usize,
    /// L2-regularization coefficient applied to both `z` and `x`
    /// (default: 0.1).
    pub l2_reg: F,
    /// Weight of the log-barrier term (default: 1.0).
    pub ln_reg: F,
    /// Decay constant in the shared regularization factor
    /// `1 / ln(decay_rate·(max_iter + 1))` (default: 1.1).
    pub decay_rate: F,
}

impl Default for BvfsmConfig<f64> {
    fn default() -> Self {
        BvfsmConfig {
            x_lr: 0.5,
            w_lr: 0.5,
            z_lr: 0.5,
            k: 10,
            max_iter: 500,
            l2_reg: 0.1,
            ln_reg: 1.0,
            decay_rate: 1.1,
        }
    }
}

impl Default for BvfsmConfig<f32> {
    fn default() -> Self {
        BvfsmConfig {
            x_lr: 0.5,
            w_lr: 0.5,
            z_lr: 0.5,
            k: 10,
            max_iter: 500,
            l2_reg: 0.1,
            ln_reg: 1.0,
            decay_rate: 1.1,
        }
    }
}

/// BVFSM: bilevel value-function smoothing with a log barrier.
///
/// Maintains a persistent surrogate `z` approximating the regularized
/// value function of the lower level. Each outer iteration refines `z` on
/// `loss_z = g(z,w) + l2·r·‖z‖²`, refines `x` on the leader objective plus
/// an interior-point barrier for the constraint `g(x,w) ≤ loss_z`: the
/// barrier argument `loss_z + 1e-4` is fixed during the `x` loop (the
/// moving and frozen `g(x,w)` terms cancel in value) while its gradient
/// `ln·r·g_x/arg` pushes `x` back into the smoothed feasible set. One
/// leader step on the same composite follows. `loss_z` is computed once
/// per outer iteration and shared by the `x` refinement and the `w`
/// update. `z` is a leaf throughout: its value enters the barrier, no
/// gradient flows into it.
pub fn bvfsm<F, P>(problem: &P, x0: &[F], w0: &[F], config: &BvfsmConfig<F>) -> Trajectory<F>
where
    F: Float,
    P: BilevelProblem<F>,
{
    let (lo, hi) = problem.bounds();
    let two = F::one() + F::one();
    let delta = F::from(1e-4).unwrap_or_else(F::epsilon);
    let mut x = x0.to_vec();
    let mut w = w0.to_vec();
    let mut z = x0.to_vec();
    let mut traj = Trajectory::new();
    let mut clock = Stopwatch::new();

    // Shared regularization-decay factor; constant for a fixed budget.
    let budget = F::from(config.max_iter + 1).unwrap_or_else(F::one);
    let r = F::one() / (config.decay_rate * budget).ln();
    let l2r = config.l2_reg * r;
    let lnr = config.ln_reg * r;

    traj.record(
        &x,
        &w,
        None,
        problem.f(&x, &w),
        g_gap(problem, &x, &w, config.z_lr, config.k),
        problem.g(&x, &w),
        clock.total(),
    );

    for _ in 0..config.max_iter {
        let gap = g_gap(problem, &x, &w, config.z_lr, config.k);

        clock.time(|| {
            // Surrogate refinement on the regularized lower level
            z = refine(&z, config.k, config.z_lr, lo, hi, |zi| {
                let gz = problem.g_x(zi, &w);
                gz.iter()
                    .zip(zi.iter())
                    .map(|(&gi, &vi)| gi + two * l2r * vi)
                    .collect()
            });

            // Barrier argument: the g(x,w) terms cancel at the evaluation
            // point, leaving the surrogate value. Fixed during the x loop.
            let loss_z = problem.g(&z, &w) + l2r * dot(&z, &z);
            let barrier_arg = loss_z + delta;

            x = refine(&x, config.k, config.x_lr, lo, hi, |xi| {
                let fx = problem.f_x(xi, &w);
                let gx = problem.g_x(xi, &w);
                fx.iter()
                    .zip(gx.iter())
                    .zip(xi.iter())
                    .map(|((&fi, &gi), &vi)| fi + lnr * gi / barrier_arg + two * l2r * vi)
                    .collect()
            });

            // Leader step on the same composite, reusing loss_z
            let fw = problem.f_w(&x, &w);
            let gw_z = problem.g_w(&z, &w);
            let gw_x = problem.g_w(&x, &w);
            let w_grad: Vec<F> = fw
                .iter()
                .zip(gw_z.iter())
                .zip(gw_x.iter())
                .map(|((&fi, &zi), &xi)| fi - lnr * (zi - xi) / barrier_arg)
                .collect();
            w = descent_step(&w, &w_grad, config.w_lr);
        });

        traj.record(
            &x,
            &w,
            None,
            problem.f(&x, &w),
            gap,
            problem.g(&x, &w),
            clock.total(),
        );
    }

    traj
}
