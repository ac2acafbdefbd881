use num_traits::Float;

/// Parameters for the backtracking Armijo line search.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmijoParams<F> {
    /// Sufficient decrease parameter (default: 1e-4).
    pub sigma: F,
    /// Backtracking factor (default: 0.5).
    pub beta: F,
    /// Minimum trial step before giving up on sufficient decrease
    /// (default: 1e-8).
    pub step_floor: F,
}

impl Default for ArmijoParams<f64> {
    fn default() -> Self {
        ArmijoParams {
            sigma: 1e-4,
            beta: 0.5,
            step_floor: 1e-8,
        }
    }
}

impl Default for ArmijoParams<f32> {
    fn default() -> Self {
        ArmijoParams {
            sigma: 1e-4,
            beta: 0.5,
            step_floor: 1e-8,
        }
    }
}

/// Outcome of a backtracking line search.
#[derive(Debug, Clone)]
pub struct LineSearchOutcome<F> {
    /// The accepted step size.
    pub t: F,
    /// Objective value at `w + t·dir`.
    pub value: F,
    /// Whether the sufficient-decrease condition held at `t`. When `false`
    /// the search hit the step-size floor and `t` is the last trial
    /// evaluated.
    pub sufficient: bool,
    /// Number of objective evaluations used.
    pub evals: usize,
}

/// Backtracking line search satisfying the Armijo (sufficient decrease)
/// condition.
///
/// Shrinks a trial step starting at `trial` until
/// `phi(w + t·dir) <= phi0 + sigma·t·slope`, where `slope = grad·dir`.
///
/// Never fails: once the shrunken step drops below
/// [`ArmijoParams::step_floor`], the last evaluated trial is returned with
/// `sufficient = false` and the caller steps anyway, trading correctness
/// for forward progress.
pub fn backtracking_armijo<F: Float>(
    mut phi: impl FnMut(&[F]) -> F,
    w: &[F],
    dir: &[F],
    phi0: F,
    slope: F,
    trial: F,
    params: &ArmijoParams<F>,
) -> LineSearchOutcome<F> {
    let n = w.len();
    debug_assert_eq!(dir.len(), n);

    let mut t = trial;
    let mut w_new = vec![F::zero(); n];
    let mut evals = 0;

    loop {
        for i in 0..n {
            w_new[i] = w[i] + t * dir[i];
        }
        let value = phi(&w_new);
        evals += 1;

        if value <= phi0 + params.sigma * t * slope {
            return LineSearchOutcome {
                t,
                value,
                sufficient: true,
                evals,
            };
        }

        let next = t * params.beta;
        if next < params.step_floor {
            return LineSearchOutcome {
                t,
                value,
                sufficient: false,
                evals,
            };
        }
        t = next;
    }
}
