//! Least-squares system identification.
//!
//! Pipeline: excitation data → ARX regression → normal-equation solve →
//! bilinear recovery of the continuous second-order model → open-loop
//! re-simulation → fit metrics.

pub mod arx;
pub mod continuous;
pub mod error;
pub mod excitation;
pub mod identify;
pub mod validation;

pub use arx::{ArxModel, ArxOrders, build_regression};
pub use continuous::ContinuousModel;
pub use error::{IdentError, IdentResult};
pub use excitation::{ExcitationConfig, IdentificationData, SineComponent, generate_dataset};
pub use identify::{Identification, IdentifyOptions, identify};
pub use validation::ValidationMetrics;
