use num_traits::Float;

/// Compute the L2 norm of a vector.
pub fn norm<F: Float>(v: &[F]) -> F {
    let mut s = F::zero();
    for &x in v {
        s = s + x * x;
    }
    s.sqrt()
}

/// Compute the dot product of two vectors.
pub fn dot<F: Float>(a: &[F], b: &[F]) -> F {
    debug_assert_eq!(a.len(), b.len());
    let mut s = F::zero();
    for i in 0..a.len() {
        s = s + a[i] * b[i];
    }
    s
}

/// Dense matrix-vector product `A·v`, with `a` stored as `a[row][col]`.
pub fn mat_vec<F: Float>(a: &[Vec<F>], v: &[F]) -> Vec<F> {
    a.iter()
        .map(|row| {
            debug_assert_eq!(row.len(), v.len());
            dot(row, v)
        })
        .collect()
}

/// Transposed matrix-vector product `Aᵀ·v`.
pub fn mat_t_vec<F: Float>(a: &[Vec<F>], v: &[F]) -> Vec<F> {
    debug_assert_eq!(a.len(), v.len());
    let cols = if a.is_empty() { 0 } else { a[0].len() };
    let mut out = vec![F::zero(); cols];
    for (i, row) in a.iter().enumerate() {
        for j in 0..cols {
            out[j] = out[j] + row[j] * v[i];
        }
    }
    out
}

/// Largest singular value of a dense matrix via power iteration on `AᵀA`.
///
/// Starts from the all-ones direction so repeated calls are deterministic.
/// Returns zero for a zero matrix.
pub fn largest_singular_value<F: Float>(a: &[Vec<F>], iters: usize) -> F {
    if a.is_empty() || a[0].is_empty() {
        return F::zero();
    }
    let n = a[0].len();
    let mut v = vec![F::one(); n];
    let scale = norm(&v);
    for vi in v.iter_mut() {
        *vi = *vi / scale;
    }

    for _ in 0..iters {
        let av = mat_vec(a, &v);
        let atav = mat_t_vec(a, &av);
        let nrm = norm(&atav);
        if nrm == F::zero() {
            return F::zero();
        }
        for (vi, &ui) in v.iter_mut().zip(atav.iter()) {
            *vi = ui / nrm;
        }
    }

    norm(&mat_vec(a, &v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norm_and_dot() {
        assert!((norm(&[3.0, 4.0]) - 5.0).abs() < 1e-12);
        assert!((dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]) - 32.0).abs() < 1e-12);
    }

    #[test]
    fn mat_vec_2x2() {
        let a = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let av = mat_vec(&a, &[1.0, 1.0]);
        assert!((av[0] - 3.0).abs() < 1e-12);
        assert!((av[1] - 7.0).abs() < 1e-12);

        let atv = mat_t_vec(&a, &[1.0, 1.0]);
        assert!((atv[0] - 4.0).abs() < 1e-12);
        assert!((atv[1] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn singular_value_diagonal() {
        let a = vec![vec![3.0, 0.0], vec![0.0, 1.0]];
        let s = largest_singular_value(&a, 100);
        assert!((s - 3.0).abs() < 1e-9, "sigma = {}", s);
    }

    #[test]
    fn singular_value_shear() {
        // AᵀA = [[1, 10], [10, 101.0201]]; largest eigenvalue ≈ 102.0101
        let a = vec![vec![1.0, 10.0], vec![0.0, 1.01]];
        let s = largest_singular_value(&a, 200);
        assert!((s - 102.0101f64.sqrt()).abs() < 1e-6, "sigma = {}", s);
    }

    #[test]
    fn singular_value_zero_matrix() {
        let a = vec![vec![0.0, 0.0], vec![0.0, 0.0]];
        assert_eq!(largest_singular_value(&a, 50), 0.0);
    }
}
