//! Error types for control operations.

use cl_core::CoreError;
use thiserror::Error;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in control operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid parameter: {what}")]
    InvalidParameter { what: &'static str },

    /// Rejected plant or numeric input.
    #[error(transparent)]
    Core(#[from] CoreError),
}
