mod conversion;
mod error;
mod problem;
mod simplex;

pub use error::SolveError;
pub use problem::{Comparison, LinearProgram, LpState, Objective, OBJECTIVE_KEY};
pub use simplex::{check_tolerance, solve, Solver, Tableau, DEFAULT_TOLERANCE};
