//! Error types for solver operations.

use cl_core::CoreError;
use thiserror::Error;

/// Errors that can occur while solving linear systems.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Dimension mismatch: {what} (expected {expected}, got {got})")]
    Dimension {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Singular system: pivot {pivot:e} in column {column}")]
    SingularSystem { column: usize, pivot: f64 },

    #[error("Underdetermined problem: {rows} rows for {cols} unknowns")]
    Underdetermined { rows: usize, cols: usize },

    #[error("Numeric error: {0}")]
    Numeric(#[from] CoreError),
}

pub type SolverResult<T> = Result<T, SolverError>;
