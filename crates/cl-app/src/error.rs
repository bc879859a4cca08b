//! Error types for the application layer.

use std::path::PathBuf;

/// Application error type wrapping the backend crates' errors so front ends
/// deal with a single type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read study file: {path}")]
    StudyFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write study file: {path}")]
    StudyFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Study validation failed: {0}")]
    Validation(String),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Control error: {0}")]
    Control(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Identification error: {0}")]
    Identification(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<cl_controls::ControlError> for AppError {
    fn from(e: cl_controls::ControlError) -> Self {
        AppError::Control(e.to_string())
    }
}

impl From<cl_sim::SimError> for AppError {
    fn from(e: cl_sim::SimError) -> Self {
        AppError::Simulation(e.to_string())
    }
}

impl From<cl_ident::IdentError> for AppError {
    fn from(e: cl_ident::IdentError) -> Self {
        AppError::Identification(e.to_string())
    }
}

impl From<cl_core::CoreError> for AppError {
    fn from(e: cl_core::CoreError) -> Self {
        AppError::Validation(e.to_string())
    }
}
