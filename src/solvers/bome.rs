use num_traits::Float;

use crate::descent::{clamp, descent_step, refine};
use crate::linalg::dot;
use crate::problem::BilevelProblem;
use crate::trajectory::{Stopwatch, Trajectory};

/// Configuration for the BOME solver (bilevel descent via gradient balance).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BomeConfig<F> {
    /// Step size for the follower variable `x` (default: 0.5).
    pub x_lr: F,
    /// Step size for the leader variable `w` (default: 0.5).
    pub w_lr: F,
    /// Step size for the follower surrogate `xhat` (default: 0.5).
    pub xhat_lr: F,
    /// Inner descent steps refining `xhat` per outer iteration (default: 10).
    pub k: usize,
    /// Outer iteration budget (default: 500).
    pub max_iter: usize,
    /// Balance threshold in `(0, 1)` for the lower-level descent
    /// requirement (default: 0.5).
    pub eta: F,
}

impl Default for BomeConfig<f64> {
    fn default() -> Self {
        BomeConfig {
            x_lr: 0.5,
            w_lr: 0.5,
            xhat_lr: 0.5,
            k: 10,
            max_iter: 500,
            eta: 0.5,
        }
    }
}

impl Default for BomeConfig<f32> {
    fn default() -> Self {
        BomeConfig {
            x_lr: 0.5,
            w_lr: 0.5,
            xhat_lr: 0.5,
            k: 10,
            max_iter: 500,
            eta: 0.5,
        }
    }
}

/// Balance coefficient `relu(eta − df·dg / (‖dg‖² + 1e-8))`.
///
/// Positive exactly when the leader direction alone would violate the
/// required descent on the lower-level gap; the floor keeps the quotient
/// finite as `dg` vanishes.
fn balance_coefficient<F: Float>(df: &[F], dg: &[F], eta: F) -> F {
    let floor = F::from(1e-8).unwrap_or_else(F::epsilon);
    let lambda = eta - dot(df, dg) / (dot(dg, dg) + floor);
    if lambda > F::zero() {
        lambda
    } else {
        F::zero()
    }
}

/// BOME: single-loop bilevel descent with a dynamic balance coefficient.
///
/// Each outer iteration resets the surrogate `xhat := x` and refines it `k`
/// steps toward the follower optimum, then takes one step of
/// `d = df + lambda·dg` on the joint state, where `df = [f_x; f_w]`,
/// `dg = [g_x; g_w − g_w(xhat)]` and `lambda` restores sufficient descent
/// on the lower-level gap whenever the leader gradient alone loses it.
/// Runs for the full iteration budget; there is no adaptive stopping.
pub fn bome<F, P>(problem: &P, x0: &[F], w0: &[F], config: &BomeConfig<F>) -> Trajectory<F>
where
    F: Float,
    P: BilevelProblem<F>,
{
    let (lo, hi) = problem.bounds();
    let n_x = x0.len();
    let mut x = x0.to_vec();
    let mut w = w0.to_vec();
    let mut traj = Trajectory::new();
    let mut clock = Stopwatch::new();

    // Initial entry: same surrogate-based gap estimate as the loop body,
    // outside the timed region.
    let xhat0 = refine(&x, config.k, config.xhat_lr, lo, hi, |xi| {
        problem.g_x(xi, &w)
    });
    traj.record(
        &x,
        &w,
        Some(&xhat0),
        problem.f(&x, &w),
        problem.g(&x, &w) - problem.g(&xhat0, &w),
        problem.g(&x, &w),
        clock.total(),
    );

    for _ in 0..config.max_iter {
        let mut xhat = Vec::new();
        let mut gap = F::zero();
        clock.time(|| {
            xhat = refine(&x, config.k, config.xhat_lr, lo, hi, |xi| {
                problem.g_x(xi, &w)
            });
            gap = problem.g(&x, &w) - problem.g(&xhat, &w);

            let fx = problem.f_x(&x, &w);
            let fw = problem.f_w(&x, &w);
            let (_, gx, gw_diff) = problem.g_diff(&x, &xhat, &w);

            let df: Vec<F> = fx.iter().chain(fw.iter()).copied().collect();
            let dg: Vec<F> = gx.iter().chain(gw_diff.iter()).copied().collect();
            let lambda = balance_coefficient(&df, &dg, config.eta);

            let d: Vec<F> = df
                .iter()
                .zip(dg.iter())
                .map(|(&a, &b)| a + lambda * b)
                .collect();
            x = descent_step(&x, &d[..n_x], config.x_lr);
            w = descent_step(&w, &d[n_x..], config.w_lr);
            clamp(&mut x, lo, hi);
        });

        traj.record(
            &x,
            &w,
            Some(&xhat),
            problem.f(&x, &w),
            gap,
            problem.g(&x, &w),
            clock.total(),
        );
    }

    traj
}
