use num_traits::Float;

use crate::descent::{clamp, descent_step};
use crate::gap::g_gap;
use crate::linalg::norm;
use crate::problem::BilevelProblem;
use crate::trajectory::{Stopwatch, Trajectory};

/// Configuration for the penalty-method solver.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PenaltyConfig<F> {
    /// Initial step size for the follower variable `x` (default: 0.5).
    pub x_lr: F,
    /// Initial step size for the leader variable `w` (default: 0.5).
    pub w_lr: F,
    /// Step size for the gap probe (default: 0.5).
    pub probe_lr: F,
    /// Inner descent steps on `x` per outer iteration (default: 10).
    pub k: usize,
    /// Outer iteration budget (default: 500).
    pub max_iter: usize,
    /// Initial weight of the `g` penalty term in the `x` update
    /// (default: 0.1).
    pub lambda_g: F,
    /// Initial stationarity tolerance triggering the schedule
    /// (default: 0.1).
    pub eps: F,
    /// Initial weight of the stationarity penalty `0.5·γ·‖g_x‖²`
    /// (default: 0.1).
    pub gamma: F,
    /// Initial value of every multiplier component (default: 1e-4).
    pub nu_init: F,
    /// Growth factor for `gamma` on trigger (default: 1.1).
    pub c_gamma: F,
    /// Shrink factor for `eps` on trigger (default: 0.9).
    pub c_eps: F,
    /// Shrink factor for `lambda_g` on trigger (default: 0.9).
    pub c_lambda: F,
    /// Shrink factor for both step sizes on trigger (default: 0.9).
    pub lr_decay: F,
}

impl Default for PenaltyConfig<f64> {
    fn default() -> Self {
        PenaltyConfig {
            x_lr: 0.5,
            w_lr: 0.5,
            probe_lr: 0.5,
            k: 10,
            max_iter: 500,
            lambda_g: 0.1,
            eps: 0.1,
            gamma: 0.1,
            nu_init: 1e-4,
            c_gamma: 1.1,
            c_eps: 0.9,
            c_lambda: 0.9,
            lr_decay: 0.9,
        }
    }
}

impl Default for PenaltyConfig<f32> {
    fn default() -> Self {
        PenaltyConfig {
            x_lr: 0.5,
            w_lr: 0.5,
            probe_lr: 0.5,
            k: 10,
            max_iter: 500,
            lambda_g: 0.1,
            eps: 0.1,
            gamma: 0.1,
            nu_init: 1e-4,
            c_gamma: 1.1,
            c_eps: 0.9,
            c_lambda: 0.9,
            lr_decay: 0.9,
        }
    }
}

/// Penalty weights, tolerance, and multiplier, tightened together when the
/// augmented gradients reach approximate stationarity.
struct PenaltySchedule<F> {
    gamma: F,
    eps: F,
    lambda_g: F,
    nu: Vec<F>,
    c_gamma: F,
    c_eps: F,
    c_lambda: F,
}

impl<F: Float> PenaltySchedule<F> {
    fn new(config: &PenaltyConfig<F>, n_x: usize) -> Self {
        PenaltySchedule {
            gamma: config.gamma,
            eps: config.eps,
            lambda_g: config.lambda_g,
            nu: vec![config.nu_init; n_x],
            c_gamma: config.c_gamma,
            c_eps: config.c_eps,
            c_lambda: config.c_lambda,
        }
    }

    /// Whether the combined augmented-gradient norms fall inside the
    /// current tolerance ball.
    fn stationary(&self, grad_x_norm: F, grad_w_norm: F) -> bool {
        grad_x_norm * grad_x_norm + grad_w_norm * grad_w_norm < self.eps * self.eps
    }

    /// Tighten the schedule: grow `gamma`, shrink `eps` and `lambda_g`,
    /// and apply the dual-ascent update `nu += gamma·g_x` with the
    /// post-growth `gamma`.
    fn tighten(&mut self, gx: &[F]) {
        self.gamma = self.gamma * self.c_gamma;
        self.eps = self.eps * self.c_eps;
        self.lambda_g = self.lambda_g * self.c_lambda;
        for (nui, &gi) in self.nu.iter_mut().zip(gx.iter()) {
            *nui = *nui + self.gamma * gi;
        }
    }
}

/// Penalty method: augmented-Lagrangian style enforcement of follower
/// stationarity.
///
/// Refines `x` on
/// `f + ⟨nu, g_x⟩/n_x + lambda_g·g + 0.5·gamma·‖g_x‖²`, then takes one
/// leader step on the same objective with the `lambda_g·g` term dropped —
/// the penalty on `g` steers only `x` toward feasibility, not `w`. When
/// the combined augmented gradients fall below `eps`, the schedule
/// tightens and both step sizes decay.
pub fn penalty<F, P>(problem: &P, x0: &[F], w0: &[F], config: &PenaltyConfig<F>) -> Trajectory<F>
where
    F: Float,
    P: BilevelProblem<F>,
{
    let (lo, hi) = problem.bounds();
    let n_x = x0.len();
    let n = F::from(n_x).unwrap_or_else(F::one);
    let mut x = x0.to_vec();
    let mut w = w0.to_vec();
    let mut x_lr = config.x_lr;
    let mut w_lr = config.w_lr;
    let mut schedule = PenaltySchedule::new(config, n_x);
    let mut traj = Trajectory::new();
    let mut clock = Stopwatch::new();

    traj.record(
        &x,
        &w,
        None,
        problem.f(&x, &w),
        g_gap(problem, &x, &w, config.probe_lr, config.k),
        problem.g(&x, &w),
        clock.total(),
    );

    for _ in 0..config.max_iter {
        let gap = g_gap(problem, &x, &w, config.probe_lr, config.k);

        clock.time(|| {
            // Until an x step has run there is no stationarity evidence
            let mut grad_x_norm = F::infinity();
            for _ in 0..config.k {
                let gx = problem.g_x(&x, &w);
                // H·(nu/n + gamma·g_x) folds both second-order terms into
                // one product
                let v: Vec<F> = schedule
                    .nu
                    .iter()
                    .zip(gx.iter())
                    .map(|(&nui, &gi)| nui / n + schedule.gamma * gi)
                    .collect();
                let hv = problem.g_xx_hvp(&x, &w, &v);
                let fx = problem.f_x(&x, &w);
                let grad: Vec<F> = fx
                    .iter()
                    .zip(hv.iter())
                    .zip(gx.iter())
                    .map(|((&fi, &hi), &gi)| fi + hi + schedule.lambda_g * gi)
                    .collect();
                grad_x_norm = norm(&grad);
                x = descent_step(&x, &grad, x_lr);
                clamp(&mut x, lo, hi);
            }

            // Leader step: same augmented objective without the lambda_g·g
            // term
            let gx = problem.g_x(&x, &w);
            let v: Vec<F> = schedule
                .nu
                .iter()
                .zip(gx.iter())
                .map(|(&nui, &gi)| nui / n + schedule.gamma * gi)
                .collect();
            let hv = problem.g_wx_hvp(&x, &w, &v);
            let fw = problem.f_w(&x, &w);
            let grad_w: Vec<F> = fw
                .iter()
                .zip(hv.iter())
                .map(|(&fi, &hi)| fi + hi)
                .collect();
            let grad_w_norm = norm(&grad_w);
            w = descent_step(&w, &grad_w, w_lr);

            if schedule.stationary(grad_x_norm, grad_w_norm) {
                schedule.tighten(&gx);
                x_lr = x_lr * config.lr_decay;
                w_lr = w_lr * config.lr_decay;
            }
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
