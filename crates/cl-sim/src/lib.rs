//! Discrete-time closed-loop simulation of a second-order plant.
//!
//! The pipeline has three pure stages joined by an immutable [`Trajectory`]:
//! [`run_sim`] produces it, [`metrics`] reduces it to scalars, and callers
//! present the result however they like.

pub mod error;
pub mod metrics;
pub mod plant;
pub mod sim;
pub mod trajectory;

pub use error::{SimError, SimResult};
pub use metrics::{
    DEFAULT_SETTLING_FRACTION, LoopMetrics, integral_squared_error, observed_damping, overshoot,
    settling_time, settling_time_forward,
};
pub use plant::{DiscretePlant, DiscretizationCoefficients, PlantParameters, discretize};
pub use sim::{ControlMode, Scenario, SimOptions, run_sim};
pub use trajectory::Trajectory;
