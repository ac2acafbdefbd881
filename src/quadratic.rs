use num_traits::Float;

use crate::linalg::{dot, largest_singular_value, mat_t_vec, mat_vec};
use crate::problem::BilevelProblem;

/// The quadratic leader/follower pair the comparison experiments run on:
///
/// ```text
/// f(x, w) = Σ_i (w_i − target_i)² + p·(x·x)
/// g(x, w) = 0.5·‖x − A·w‖²
/// ```
///
/// `g` is strongly convex in `x` with the closed-form regularized minimizer
/// `x_star(w, alpha) = A·w / (1 + 2p·alpha)`. The follower operator `A` is
/// a field of the value object, so condition-number sweeps construct one
/// instance per operator instead of mutating shared state.
///
/// All oracle methods are hand-derived closed forms.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToyQuadratic<F> {
    /// Follower linear operator, `dim_x` rows by `dim_w` columns.
    a: Vec<Vec<F>>,
    /// Leader target for `w`.
    w_target: Vec<F>,
    /// Weight of the leader's `x·x` penalty term.
    x_penalty: F,
}

impl<F: Float> ToyQuadratic<F> {
    /// The standard leader `(w0−3)² + (w1+2)² + 0.2·x·x` over the given
    /// operator.
    pub fn new(a: Vec<Vec<F>>) -> Self {
        assert!(!a.is_empty() && a[0].len() == 2, "operator must have two columns");
        let three = F::from(3.0).unwrap_or_else(F::zero);
        let two = F::from(2.0).unwrap_or_else(F::zero);
        let penalty = F::from(0.2).unwrap_or_else(F::zero);
        Self::with_leader(a, vec![three, F::zero() - two], penalty)
    }

    /// Problem with a custom leader target and penalty weight.
    pub fn with_leader(a: Vec<Vec<F>>, w_target: Vec<F>, x_penalty: F) -> Self {
        assert!(!a.is_empty());
        let cols = a[0].len();
        assert!(a.iter().all(|row| row.len() == cols));
        assert_eq!(w_target.len(), cols);
        ToyQuadratic {
            a,
            w_target,
            x_penalty,
        }
    }

    /// Borrow the follower operator.
    pub fn operator(&self) -> &[Vec<F>] {
        &self.a
    }

    /// Lipschitz-safe trial step `0.9 / L` for the reduced objective, with
    /// `L = 2 + 2p·σ_max(A)²` bounding its smoothness constant.
    pub fn safe_step(&self) -> F {
        let sigma = largest_singular_value(&self.a, 64);
        let two = F::one() + F::one();
        let l = two + two * self.x_penalty * sigma * sigma;
        F::from(0.9).unwrap_or_else(F::one) / l
    }

    fn residual(&self, x: &[F], w: &[F]) -> Vec<F> {
        let aw = mat_vec(&self.a, w);
        x.iter().zip(aw.iter()).map(|(&xi, &ai)| xi - ai).collect()
    }
}

impl Default for ToyQuadratic<f64> {
    /// The medium-conditioned operator used across the comparison runs.
    fn default() -> Self {
        ToyQuadratic::new(vec![vec![1.0, 10.0], vec![0.0, 1.01]])
    }
}

impl Default for ToyQuadratic<f32> {
    fn default() -> Self {
        ToyQuadratic::new(vec![vec![1.0, 10.0], vec![0.0, 1.01]])
    }
}

impl<F: Float> BilevelProblem<F> for ToyQuadratic<F> {
    fn dim_x(&self) -> usize {
        self.a.len()
    }

    fn dim_w(&self) -> usize {
        self.a[0].len()
    }

    fn f(&self, x: &[F], w: &[F]) -> F {
        let mut leader = F::zero();
        for (&wi, &ti) in w.iter().zip(self.w_target.iter()) {
            let d = wi - ti;
            leader = leader + d * d;
        }
        leader + self.x_penalty * dot(x, x)
    }

    fn g(&self, x: &[F], w: &[F]) -> F {
        let r = self.residual(x, w);
        let half = F::from(0.5).unwrap_or_else(F::one);
        half * dot(&r, &r)
    }

    fn f_x(&self, x: &[F], _w: &[F]) -> Vec<F> {
        let two = F::one() + F::one();
        x.iter().map(|&xi| two * self.x_penalty * xi).collect()
    }

    fn f_w(&self, _x: &[F], w: &[F]) -> Vec<F> {
        let two = F::one() + F::one();
        w.iter()
            .zip(self.w_target.iter())
            .map(|(&wi, &ti)| two * (wi - ti))
            .collect()
    }

    fn g_x(&self, x: &[F], w: &[F]) -> Vec<F> {
        self.residual(x, w)
    }

    fn g_w(&self, x: &[F], w: &[F]) -> Vec<F> {
        let r = self.residual(x, w);
        mat_t_vec(&self.a, &r)
            .into_iter()
            .map(|v| F::zero() - v)
            .collect()
    }

    fn x_star(&self, w: &[F], alpha: F) -> Vec<F> {
        let two = F::one() + F::one();
        let scale = F::one() + two * self.x_penalty * alpha;
        mat_vec(&self.a, w).into_iter().map(|v| v / scale).collect()
    }

    fn g_xx_hvp(&self, _x: &[F], _w: &[F], v: &[F]) -> Vec<F> {
        // ∂²g/∂x² is the identity
        v.to_vec()
    }

    fn g_wx_hvp(&self, _x: &[F], _w: &[F], v: &[F]) -> Vec<F> {
        // ∂g_x/∂w = −A
        mat_t_vec(&self.a, v)
            .into_iter()
            .map(|u| F::zero() - u)
            .collect()
    }

    fn phi_grad(&self, w: &[F], alpha: F) -> Vec<F> {
        let two = F::one() + F::one();
        let scale = F::one() + two * self.x_penalty * alpha;
        let x = self.x_star(w, alpha);
        // (dx*/dw)ᵀ·f_x = (2p/scale)·Aᵀ·x*
        let chain = mat_t_vec(&self.a, &x);
        let coef = two * self.x_penalty / scale;
        self.f_w(&x, w)
            .into_iter()
            .zip(chain.into_iter())
            .map(|(fw, c)| fw + coef * c)
            .collect()
    }
}
