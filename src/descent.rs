use num_traits::Float;

/// One explicit gradient-descent step: `point − lr·grad`.
///
/// A pure function — there is no hidden optimizer state; momentum-free SGD
/// is exactly this.
pub fn descent_step<F: Float>(point: &[F], grad: &[F], lr: F) -> Vec<F> {
    debug_assert_eq!(point.len(), grad.len());
    point
        .iter()
        .zip(grad.iter())
        .map(|(&p, &g)| p - lr * g)
        .collect()
}

/// Clamp every component of `v` to `[lo, hi]` in place.
pub fn clamp<F: Float>(v: &mut [F], lo: F, hi: F) {
    for vi in v.iter_mut() {
        if *vi < lo {
            *vi = lo;
        } else if *vi > hi {
            *vi = hi;
        }
    }
}

/// Fixed-budget clamped gradient descent on a caller-supplied gradient.
///
/// Runs exactly `k` steps from a copy of `start`, clamping to `[lo, hi]`
/// after each step. There is no convergence check: approximation quality is
/// controlled by `k` and the step size.
pub fn refine<F: Float>(
    start: &[F],
    k: usize,
    lr: F,
    lo: F,
    hi: F,
    mut grad_fn: impl FnMut(&[F]) -> Vec<F>,
) -> Vec<F> {
    let mut v = start.to_vec();
    for _ in 0..k {
        let grad = grad_fn(&v);
        v = descent_step(&v, &grad, lr);
        clamp(&mut v, lo, hi);
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descent_step_moves_against_gradient() {
        let p = descent_step(&[1.0, -2.0], &[0.5, -0.5], 0.1);
        assert!((p[0] - 0.95).abs() < 1e-12);
        assert!((p[1] + 1.95).abs() < 1e-12);
    }

    #[test]
    fn clamp_limits_components() {
        let mut v = vec![-150.0, 0.0, 150.0];
        clamp(&mut v, -100.0, 100.0);
        assert_eq!(v, vec![-100.0, 0.0, 100.0]);
    }

    #[test]
    fn refine_descends_quadratic() {
        // min 0.5*||v||^2, gradient v; lr 0.5 halves the point each step
        let out = refine(&[8.0, -8.0], 3, 0.5, -100.0, 100.0, |v| v.to_vec());
        assert!((out[0] - 1.0).abs() < 1e-12, "out = {:?}", out);
        assert!((out[1] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn refine_zero_budget_is_identity() {
        let out = refine(&[3.0, 4.0], 0, 0.5, -100.0, 100.0, |v| v.to_vec());
        assert_eq!(out, vec![3.0, 4.0]);
    }

    #[test]
    fn refine_respects_bounds() {
        // Ascent direction pushes the iterate out of the box
        let out = refine(&[90.0], 5, 1.0, -100.0, 100.0, |v| vec![-v[0]]);
        assert!(out[0] <= 100.0);
    }
}
