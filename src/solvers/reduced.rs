use num_traits::Float;

use crate::line_search::{backtracking_armijo, ArmijoParams};
use crate::linalg::{dot, norm};
use crate::problem::BilevelProblem;
use crate::trajectory::{ReducedTrajectory, Stopwatch};

/// Configuration for the reduced-gradient solver.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReducedConfig<F> {
    /// Initial regularization weight (default: 1.0).
    pub alpha0: F,
    /// Shrink factor applied to `alpha` after each outer pass
    /// (default: 0.5).
    pub delta: F,
    /// Initial trial step for the line search (default: 0.45, the
    /// Lipschitz-safe step when the follower operator vanishes — derive a
    /// problem-specific value such as `ToyQuadratic::safe_step` instead).
    pub step: F,
    /// Inner descent steps per regularization level (default: 50).
    pub max_inner: usize,
    /// Inner stopping tolerance on `‖∇phi_alpha‖` (default: 1e-8).
    pub tol_inner: F,
    /// Outer stopping threshold on `alpha` (default: 1e-4).
    pub tol_outer: F,
    /// Line search parameters.
    pub line_search: ArmijoParams<F>,
}

impl Default for ReducedConfig<f64> {
    fn default() -> Self {
        ReducedConfig {
            alpha0: 1.0,
            delta: 0.5,
            step: 0.45,
            max_inner: 50,
            tol_inner: 1e-8,
            tol_outer: 1e-4,
            line_search: ArmijoParams::default(),
        }
    }
}

impl Default for ReducedConfig<f32> {
    fn default() -> Self {
        ReducedConfig {
            alpha0: 1.0,
            delta: 0.5,
            step: 0.45,
            max_inner: 50,
            tol_inner: 1e-6,
            tol_outer: 1e-4,
            line_search: ArmijoParams::default(),
        }
    }
}

/// Reduced-gradient descent with an exact (closed-form) follower.
///
/// Outer continuation loop on the regularization weight `alpha`, shrunk by
/// `delta` each pass until it falls below `tol_outer`; each pass runs up to
/// `max_inner` steps of backtracking gradient descent on the reduced
/// objective `phi_alpha(w) = f(x_star(w, alpha), w)`. Solving the
/// well-conditioned regularized surrogates in sequence traces a
/// continuation path to the true reduced objective, which may be
/// ill-conditioned to attack directly.
///
/// Every inner step records `(w, phi, alpha)` before stepping; a terminal
/// entry after the final pass puts the accepted `w` in the bundle.
pub fn reduced_descent<F, P>(
    problem: &P,
    w0: &[F],
    config: &ReducedConfig<F>,
) -> ReducedTrajectory<F>
where
    F: Float,
    P: BilevelProblem<F>,
{
    let mut w = w0.to_vec();
    let mut alpha = config.alpha0;
    let mut last_alpha = alpha;
    let mut traj = ReducedTrajectory::new();
    let mut clock = Stopwatch::new();

    while alpha > config.tol_outer {
        last_alpha = alpha;
        for _ in 0..config.max_inner {
            let mut grad = Vec::new();
            let mut phi0 = F::zero();
            clock.time(|| {
                grad = problem.phi_grad(&w, alpha);
                phi0 = problem.phi(&w, alpha);
            });
            traj.record(&w, phi0, alpha, clock.total());

            if norm(&grad) < config.tol_inner {
                break;
            }

            clock.time(|| {
                let dir: Vec<F> = grad.iter().map(|&gi| F::zero() - gi).collect();
                let slope = dot(&grad, &dir);
                let outcome = backtracking_armijo(
                    |wt| problem.phi(wt, alpha),
                    &w,
                    &dir,
                    phi0,
                    slope,
                    config.step,
                    &config.line_search,
                );
                for (wi, &di) in w.iter_mut().zip(dir.iter()) {
                    *wi = *wi + outcome.t * di;
                }
            });
        }
        alpha = alpha * config.delta;
    }

    traj.record(&w, problem.phi(&w, last_alpha), last_alpha, clock.total());
    traj
}
