use thiserror::Error;

/// Terminal failures of the normalization/solve pipeline.
///
/// None of these are retried internally: the caller has to change the model
/// and run the whole pipeline again.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    /// The initial slack basis has a negative right-hand side.
    #[error("infeasible problem")]
    Infeasible,
    /// An entering column has no positive entry to bound the ratio test.
    #[error("unbounded problem")]
    Unbounded,
    /// The solution was requested before a successful solve.
    #[error("solution not available")]
    SolutionUnavailable,
    /// Tolerance must be finite and non-negative.
    #[error("invalid tolerance {value}: expected a finite value >= 0")]
    InvalidTolerance { value: f64 },
    #[error("iteration limit of {limit} reached without an optimal basis")]
    IterationLimit { limit: usize },
    #[error("model shape mismatch in {field}: expected {expected}, found {found}")]
    DimensionMismatch {
        field: String,
        expected: usize,
        found: usize,
    },
}
