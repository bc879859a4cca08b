//! cl-core: stable foundation for closedloop.
//!
//! Contains:
//! - numeric (Real, validation and series helpers)
//! - plant (second-order process parameters and their poles)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod plant;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use plant::{PlantParameters, Pole};
