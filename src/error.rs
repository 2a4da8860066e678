//! The error taxonomy for the sizing pipeline.
//!
//! Input/output plumbing uses [`anyhow`] with context as usual; errors raised
//! by the core computation steps are typed so that callers can distinguish a
//! bad parameter set from bad curve data or an unusable solver outcome.
use crate::solver::SolutionStatus;
use thiserror::Error;

/// An error arising while assembling or solving the sizing problem.
#[derive(Debug, Error, PartialEq)]
pub enum SizingError {
    /// A parameter is missing, non-positive or otherwise unusable.
    ///
    /// Raised before model construction begins.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// The generator fuel curve has fewer than two usable breakpoints.
    #[error("invalid fuel curve data: {0}")]
    CurveData(String),
    /// The solver finished with a status that yields no usable solution.
    ///
    /// An infeasible model will not become feasible by retrying, so this is
    /// surfaced to the caller rather than handled internally.
    #[error("solver finished with status {0}")]
    SolverStatus(SolutionStatus),
}

/// Shorthand for results produced by the core computation steps.
pub type SizingResult<T> = Result<T, SizingError>;
