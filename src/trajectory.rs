use std::time::Instant;

use num_traits::Float;

/// Per-iteration series recorded by the single-loop solvers.
///
/// Every series has the same length: one initial entry recorded before any
/// update, then one entry per outer iteration. The `xhat` series is present
/// only for solvers that maintain a follower surrogate (it stays empty
/// otherwise). Series are append-only; entries are never rewritten.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trajectory<F> {
    /// Follower variable per recorded iteration.
    pub x: Vec<Vec<F>>,
    /// Leader variable per recorded iteration.
    pub w: Vec<Vec<F>>,
    /// Follower surrogate per recorded iteration (empty when unused).
    pub xhat: Vec<Vec<F>>,
    /// Leader objective `f(x, w)`.
    pub f: Vec<F>,
    /// Lower-level gap estimate.
    pub g: Vec<F>,
    /// Raw lower-level value `g(x, w)`.
    pub gg: Vec<F>,
    /// Cumulative wall-clock seconds spent in the update blocks.
    pub t: Vec<F>,
}

impl<F: Float> Trajectory<F> {
    pub fn new() -> Self {
        Trajectory {
            x: Vec::new(),
            w: Vec::new(),
            xhat: Vec::new(),
            f: Vec::new(),
            g: Vec::new(),
            gg: Vec::new(),
            t: Vec::new(),
        }
    }

    /// Append one full snapshot. A solver must pass `xhat` on every record
    /// or on none.
    pub fn record(
        &mut self,
        x: &[F],
        w: &[F],
        xhat: Option<&[F]>,
        f: F,
        gap: F,
        g_value: F,
        elapsed: F,
    ) {
        self.x.push(x.to_vec());
        self.w.push(w.to_vec());
        if let Some(xh) = xhat {
            self.xhat.push(xh.to_vec());
        }
        self.f.push(f);
        self.g.push(gap);
        self.gg.push(g_value);
        self.t.push(elapsed);
        debug_assert!(self.xhat.is_empty() || self.xhat.len() == self.x.len());
    }

    /// Number of recorded iterations (including the initial entry).
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Series recorded by the reduced-gradient solver: one entry per inner
/// descent step, plus a terminal entry for the accepted final `w`.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReducedTrajectory<F> {
    /// Leader variable per recorded step.
    pub w: Vec<Vec<F>>,
    /// Reduced objective `phi_alpha(w)` per recorded step.
    pub f: Vec<F>,
    /// Regularization weight in force at each recorded step.
    pub alpha: Vec<F>,
    /// Cumulative wall-clock seconds spent in the update blocks.
    pub t: Vec<F>,
}

impl<F: Float> ReducedTrajectory<F> {
    pub fn new() -> Self {
        ReducedTrajectory {
            w: Vec::new(),
            f: Vec::new(),
            alpha: Vec::new(),
            t: Vec::new(),
        }
    }

    pub fn record(&mut self, w: &[F], phi: F, alpha: F, elapsed: F) {
        self.w.push(w.to_vec());
        self.f.push(phi);
        self.alpha.push(alpha);
        self.t.push(elapsed);
    }

    pub fn len(&self) -> usize {
        self.w.len()
    }

    pub fn is_empty(&self) -> bool {
        self.w.is_empty()
    }
}

/// Accumulates wall-clock time around solver update blocks.
///
/// Timing brackets the numeric update tightly; gap probes and trajectory
/// bookkeeping stay outside so the `t` series remains comparable across
/// solvers.
pub struct Stopwatch<F> {
    total: F,
}

impl<F: Float> Stopwatch<F> {
    pub fn new() -> Self {
        Stopwatch { total: F::zero() }
    }

    /// Run `block`, adding its wall-clock duration to the running total.
    pub fn time<R>(&mut self, block: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let out = block();
        self.total = self.total
            + F::from(start.elapsed().as_secs_f64()).unwrap_or_else(F::zero);
        out
    }

    /// Total seconds accumulated so far.
    pub fn total(&self) -> F {
        self.total
    }
}

impl<F: Float> Default for Stopwatch<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_lengths_stay_equal() {
        let mut traj = Trajectory::new();
        traj.record(&[1.0, 2.0], &[3.0], Some(&[0.5, 0.5]), 1.0, 0.1, 2.0, 0.0);
        traj.record(&[1.1, 2.1], &[3.1], Some(&[0.6, 0.6]), 0.9, 0.05, 1.8, 0.01);

        assert_eq!(traj.len(), 2);
        assert_eq!(traj.w.len(), 2);
        assert_eq!(traj.xhat.len(), 2);
        assert_eq!(traj.f.len(), 2);
        assert_eq!(traj.g.len(), 2);
        assert_eq!(traj.gg.len(), 2);
        assert_eq!(traj.t.len(), 2);
    }

    #[test]
    fn xhat_series_optional() {
        let mut traj: Trajectory<f64> = Trajectory::new();
        traj.record(&[1.0], &[2.0], None, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(traj.len(), 1);
        assert!(traj.xhat.is_empty());
    }

    #[test]
    fn stopwatch_accumulates() {
        let mut clock: Stopwatch<f64> = Stopwatch::new();
        assert_eq!(clock.total(), 0.0);
        let out = clock.time(|| 41 + 1);
        assert_eq!(out, 42);
        assert!(clock.total() >= 0.0);

        let before = clock.total();
        clock.time(|| std::hint::black_box((0..1000).sum::<u64>()));
        assert!(clock.total() >= before);
    }

    #[test]
    fn reduced_trajectory_records() {
        let mut traj = ReducedTrajectory::new();
        traj.record(&[1.0, -1.0], 5.0, 1.0, 0.0);
        traj.record(&[0.5, -0.5], 2.0, 0.5, 0.01);
        assert_eq!(traj.len(), 2);
        assert_eq!(traj.f, vec![5.0, 2.0]);
        assert_eq!(traj.alpha, vec![1.0, 0.5]);
    }
}
