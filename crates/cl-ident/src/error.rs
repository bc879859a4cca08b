//! Error types for identification.

use cl_core::CoreError;
use cl_sim::SimError;
use cl_solver::SolverError;
use thiserror::Error;

pub type IdentResult<T> = Result<T, IdentError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdentError {
    #[error("Invalid parameter: {what}")]
    InvalidParameter { what: &'static str },

    #[error("Length mismatch for {what}: {left} vs {right}")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    /// Not enough samples for the requested model structure.
    #[error("Need at least {needed} samples, got {got}")]
    TooFewSamples { needed: usize, got: usize },

    /// The fitted discrete model maps to no physical continuous model.
    #[error("Degenerate model: {what}")]
    DegenerateModel { what: &'static str },

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Simulation error: {0}")]
    Sim(#[from] SimError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
