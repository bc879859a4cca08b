//! Feedback control primitives for closedloop.
//!
//! - [`controller`]: the sampled PID law with output saturation and
//!   conditional anti-windup. Integration rule and derivative source are
//!   configuration enums on a single controller type.
//! - [`tuning`]: analytic gain design by pole placement for the
//!   second-order plant, plus the simplified PI design used for
//!   identified models.

pub mod controller;
pub mod error;
pub mod tuning;

pub use controller::{
    DerivativeMode, IntegrationRule, OutputLimits, PIDController, PIDControllerState, PIDGains,
};
pub use error::{ControlError, ControlResult};
pub use tuning::{
    DampingRegime, DesignTarget, GainFloors, PoleTuner, PoleTuning, closed_loop_coefficients,
};
