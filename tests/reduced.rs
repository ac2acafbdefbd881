use bilevel_descent::{reduced_descent, BilevelProblem, ReducedConfig, ToyQuadratic};

fn config_for(p: &ToyQuadratic<f64>) -> ReducedConfig<f64> {
    ReducedConfig {
        step: p.safe_step(),
        ..Default::default()
    }
}

/// Minimizer of the limiting reduced objective
/// `‖w − t‖² + p·‖Aw‖²`, i.e. the solution of `(I + p·AᵀA)·w = t`
/// for the standard leader (`t = [3, −2]`, `p = 0.2`), solved by hand for
/// the 2x2 case.
fn limiting_minimizer(a: &[Vec<f64>]) -> [f64; 2] {
    let mut ata = [[0.0; 2]; 2];
    for i in 0..2 {
        for j in 0..2 {
            for row in a {
                ata[i][j] += row[i] * row[j];
            }
        }
    }
    let m = [
        [1.0 + 0.2 * ata[0][0], 0.2 * ata[0][1]],
        [0.2 * ata[1][0], 1.0 + 0.2 * ata[1][1]],
    ];
    let t = [3.0, -2.0];
    let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
    [
        (m[1][1] * t[0] - m[0][1] * t[1]) / det,
        (m[0][0] * t[1] - m[1][0] * t[0]) / det,
    ]
}

#[test]
fn alpha_anneals_monotonically_with_bounded_outer_passes() {
    let p = ToyQuadratic::default();
    let traj = reduced_descent(&p, &[0.0, 0.0], &config_for(&p));

    for pair in traj.alpha.windows(2) {
        assert!(pair[1] <= pair[0], "alpha must never increase");
    }

    // ceil(log(tol_outer / alpha0) / log(delta)) distinct levels
    let expected = (1e-4f64.ln() / 0.5f64.ln()).ceil() as usize;
    let mut levels = traj.alpha.clone();
    levels.dedup();
    assert_eq!(levels.len(), expected, "levels = {:?}", levels);
}

#[test]
fn phi_is_non_increasing_within_each_alpha_block() {
    let p = ToyQuadratic::default();
    let traj = reduced_descent(&p, &[0.0, 0.0], &config_for(&p));

    for i in 1..traj.len() {
        if traj.alpha[i] == traj.alpha[i - 1] {
            assert!(
                traj.f[i] <= traj.f[i - 1] + 1e-9,
                "phi rose within a block at step {}: {} -> {}",
                i,
                traj.f[i - 1],
                traj.f[i]
            );
        }
    }
}

#[test]
fn converges_to_limiting_minimizer_default_operator() {
    let p = ToyQuadratic::default();
    let traj = reduced_descent(&p, &[0.0, 0.0], &config_for(&p));

    let expected = limiting_minimizer(p.operator());
    let w_final = traj.w.last().unwrap();
    for i in 0..2 {
        assert!(
            (w_final[i] - expected[i]).abs() < 1e-3,
            "w[{}] = {}, expected {}",
            i,
            w_final[i],
            expected[i]
        );
    }
}

#[test]
fn converges_near_leader_target_when_operator_is_tame() {
    // With a well-conditioned operator the follower penalty barely bends
    // the leader optimum away from its target
    let p = ToyQuadratic::new(vec![vec![1.0, 1.0], vec![0.0, 1.0]]);
    let traj = reduced_descent(&p, &[-2.0, 5.0], &config_for(&p));

    let w_final = traj.w.last().unwrap();
    assert!((w_final[0] - 3.0).abs() < 0.25, "w[0] = {}", w_final[0]);
    assert!((w_final[1] + 2.0).abs() < 0.25, "w[1] = {}", w_final[1]);

    let expected = limiting_minimizer(p.operator());
    for i in 0..2 {
        assert!((w_final[i] - expected[i]).abs() < 1e-3);
    }
}

#[test]
fn bundle_series_have_equal_lengths() {
    let p = ToyQuadratic::default();
    let traj = reduced_descent(&p, &[0.0, 0.0], &config_for(&p));

    let n = traj.len();
    assert!(n > 14, "expected at least one record per outer pass");
    assert_eq!(traj.w.len(), n);
    assert_eq!(traj.f.len(), n);
    assert_eq!(traj.alpha.len(), n);
    assert_eq!(traj.t.len(), n);
}

#[test]
fn terminal_entry_carries_the_accepted_state() {
    let p = ToyQuadratic::default();
    let traj = reduced_descent(&p, &[0.0, 0.0], &config_for(&p));

    // The terminal record re-evaluates phi at the final w under the last
    // alpha actually optimized
    let w_final = traj.w.last().unwrap();
    let alpha_final = *traj.alpha.last().unwrap();
    assert!(alpha_final > 1e-4 * 0.5, "alpha = {}", alpha_final);
    let phi = p.phi(w_final, alpha_final);
    assert!((phi - traj.f.last().unwrap()).abs() < 1e-12);
}

#[test]
fn runs_are_deterministic() {
    let p = ToyQuadratic::default();
    let a = reduced_descent(&p, &[0.0, 0.0], &config_for(&p));
    let b = reduced_descent(&p, &[0.0, 0.0], &config_for(&p));

    assert_eq!(a.w, b.w);
    assert_eq!(a.f, b.f);
    assert_eq!(a.alpha, b.alpha);
}

#[test]
fn degenerate_budget_still_yields_a_bundle() {
    // alpha0 already below the outer tolerance: no optimization happens,
    // but the bundle still carries the initial state
    let p = ToyQuadratic::default();
    let config = ReducedConfig {
        alpha0: 1e-6,
        step: p.safe_step(),
        ..Default::default()
    };
    let traj = reduced_descent(&p, &[1.0, 1.0], &config);

    assert_eq!(traj.len(), 1);
    assert_eq!(traj.w[0], vec![1.0, 1.0]);
    assert_eq!(traj.alpha[0], 1e-6);
}
