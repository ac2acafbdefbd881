use num_traits::Float;

/// Lower box bound applied to follower-side variables after every update.
pub const LOWER: f64 = -100.0;
/// Upper box bound applied to follower-side variables after every update.
pub const UPPER: f64 = 100.0;

/// A bilevel problem `min_{x,w} f(x,w) s.t. x ∈ argmin_x g(x,w)`.
///
/// This trait is the gradient-oracle seam: implementors may back it with an
/// automatic-differentiation engine or with hand-derived closed forms — the
/// solvers are agnostic to which.
///
/// The first-order methods (`f_x`, `f_w`, `g_x`, `g_w`) default to zero
/// vectors, so a problem whose objective does not depend on an argument
/// simply leaves the corresponding method unimplemented. A zero gradient is
/// substituted; a missing dependency is never an error.
pub trait BilevelProblem<F: Float> {
    /// Dimension of the follower variable `x`.
    fn dim_x(&self) -> usize;

    /// Dimension of the leader variable `w`.
    fn dim_w(&self) -> usize;

    /// Leader objective `f(x, w)`.
    fn f(&self, x: &[F], w: &[F]) -> F;

    /// Follower objective `g(x, w)`, strongly convex in `x`.
    fn g(&self, x: &[F], w: &[F]) -> F;

    /// `∂f/∂x`.
    fn f_x(&self, x: &[F], w: &[F]) -> Vec<F> {
        let _ = (x, w);
        vec![F::zero(); self.dim_x()]
    }

    /// `∂f/∂w`.
    fn f_w(&self, x: &[F], w: &[F]) -> Vec<F> {
        let _ = (x, w);
        vec![F::zero(); self.dim_w()]
    }

    /// `∂g/∂x`.
    fn g_x(&self, x: &[F], w: &[F]) -> Vec<F> {
        let _ = (x, w);
        vec![F::zero(); self.dim_x()]
    }

    /// `∂g/∂w`.
    fn g_w(&self, x: &[F], w: &[F]) -> Vec<F> {
        let _ = (x, w);
        vec![F::zero(); self.dim_w()]
    }

    /// Value and gradients of `g(x,w) − g(xhat,w)` with `xhat` held constant.
    ///
    /// Returns `(loss, ∂loss/∂x, ∂loss/∂w)`. No gradient flows through
    /// `xhat`, but `w`'s dependence through `g(xhat, w)` is retained.
    fn g_diff(&self, x: &[F], xhat: &[F], w: &[F]) -> (F, Vec<F>, Vec<F>) {
        let loss = self.g(x, w) - self.g(xhat, w);
        let grad_x = self.g_x(x, w);
        let gw = self.g_w(x, w);
        let gw_hat = self.g_w(xhat, w);
        let grad_w = gw
            .iter()
            .zip(gw_hat.iter())
            .map(|(&a, &b)| a - b)
            .collect();
        (loss, grad_x, grad_w)
    }

    /// Closed-form minimizer of the regularized lower level,
    /// `x_star(w, alpha) → argmin_x g(x, w)` as `alpha → 0`.
    ///
    /// Default implementation panics. Only solvers that exploit an exact
    /// follower call this.
    fn x_star(&self, w: &[F], alpha: F) -> Vec<F> {
        let _ = (w, alpha);
        unimplemented!("x_star not implemented for this problem")
    }

    /// Hessian-vector product `(∂²g/∂x²)·v`.
    ///
    /// Default implementation panics. Only solvers that penalize follower
    /// stationarity call this.
    fn g_xx_hvp(&self, x: &[F], w: &[F], v: &[F]) -> Vec<F> {
        let _ = (x, w, v);
        unimplemented!("g_xx_hvp not implemented for this problem")
    }

    /// Cross product `(∂g_x/∂w)ᵀ·v`, the gradient with respect to `w` of
    /// `⟨g_x(x,w), v⟩` with `v` held constant.
    ///
    /// Default implementation panics. Only solvers that penalize follower
    /// stationarity call this.
    fn g_wx_hvp(&self, x: &[F], w: &[F], v: &[F]) -> Vec<F> {
        let _ = (x, w, v);
        unimplemented!("g_wx_hvp not implemented for this problem")
    }

    /// Reduced objective `phi_alpha(w) = f(x_star(w, alpha), w)`.
    fn phi(&self, w: &[F], alpha: F) -> F {
        self.f(&self.x_star(w, alpha), w)
    }

    /// Gradient of the reduced objective with respect to `w`.
    ///
    /// Default implementation panics. Only the reduced-gradient solver
    /// calls this.
    fn phi_grad(&self, w: &[F], alpha: F) -> Vec<F> {
        let _ = (w, alpha);
        unimplemented!("phi_grad not implemented for this problem")
    }

    /// Box bounds applied to follower-side variables after every update.
    ///
    /// A numerical-stability safeguard, not a problem constraint.
    fn bounds(&self) -> (F, F) {
        (
            F::from(LOWER).unwrap_or_else(F::min_value),
            F::from(UPPER).unwrap_or_else(F::max_value),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Leader that ignores `x`; follower that ignores `w`.
    struct Decoupled;

    impl BilevelProblem<f64> for Decoupled {
        fn dim_x(&self) -> usize {
            2
        }

        fn dim_w(&self) -> usize {
            1
        }

        fn f(&self, _x: &[f64], w: &[f64]) -> f64 {
            w[0] * w[0]
        }

        fn g(&self, x: &[f64], _w: &[f64]) -> f64 {
            0.5 * (x[0] * x[0] + x[1] * x[1])
        }

        fn f_w(&self, _x: &[f64], w: &[f64]) -> Vec<f64> {
            vec![2.0 * w[0]]
        }

        fn g_x(&self, x: &[f64], _w: &[f64]) -> Vec<f64> {
            x.to_vec()
        }
    }

    #[test]
    fn unused_gradients_are_zero() {
        let p = Decoupled;
        assert_eq!(p.f_x(&[1.0, 2.0], &[3.0]), vec![0.0, 0.0]);
        assert_eq!(p.g_w(&[1.0, 2.0], &[3.0]), vec![0.0]);
    }

    #[test]
    fn g_diff_treats_xhat_as_constant() {
        let p = Decoupled;
        let (loss, grad_x, grad_w) = p.g_diff(&[2.0, 0.0], &[1.0, 0.0], &[3.0]);
        assert!((loss - 1.5).abs() < 1e-12);
        // grad_x is g_x at x, untouched by xhat
        assert_eq!(grad_x, vec![2.0, 0.0]);
        // g does not depend on w here, so both g_w terms vanish
        assert_eq!(grad_w, vec![0.0]);
    }

    #[test]
    fn default_bounds() {
        let p = Decoupled;
        let (lo, hi) = p.bounds();
        assert_eq!(lo, -100.0);
        assert_eq!(hi, 100.0);
    }
}
