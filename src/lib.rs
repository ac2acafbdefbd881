pub mod descent;
pub mod gap;
pub mod linalg;
pub mod line_search;
pub mod problem;
pub mod quadratic;
pub mod solvers;
pub mod trajectory;

pub use gap::g_gap;
pub use line_search::{backtracking_armijo, ArmijoParams, LineSearchOutcome};
pub use problem::{BilevelProblem, LOWER, UPPER};
pub use quadratic::ToyQuadratic;
pub use solvers::bome::{bome, BomeConfig};
pub use solvers::bsg::{bsg1, Bsg1Config};
pub use solvers::bvfsm::{bvfsm, BvfsmConfig};
pub use solvers::penalty::{penalty, PenaltyConfig};
pub use solvers::reduced::{reduced_descent, ReducedConfig};
pub use trajectory::{ReducedTrajectory, Stopwatch, Trajectory};
