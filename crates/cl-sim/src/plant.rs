//! Plant discretization.
//!
//! Backward differences on `τ²ÿ + 2ζτẏ + y = K·u + bias` give, for k >= 2,
//!
//! ```text
//! y[k] = (−c1·y[k−1] − c2·y[k−2] + (K/τ²)·u[k] + (1/τ²)·bias) / c0
//! ```

use crate::error::{SimError, SimResult};
pub use cl_core::PlantParameters;
use serde::{Deserialize, Serialize};

/// Recurrence coefficients for a fixed step size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscretizationCoefficients {
    /// `1/Δt² + 2ζ/(τΔt) + 1/τ²` (always > 0)
    pub c0: f64,
    /// `−2/Δt² − 2ζ/(τΔt)`
    pub c1: f64,
    /// `1/Δt²`
    pub c2: f64,
}

/// Recurrence coefficients for `plant` at step `dt`.
///
/// # Errors
///
/// [`SimError::InvalidParameter`] if `dt` is not positive and finite, or a
/// plant error if the parameters are out of range.
pub fn discretize(plant: &PlantParameters, dt: f64) -> SimResult<DiscretizationCoefficients> {
    plant.validate()?;
    if !(dt > 0.0 && dt.is_finite()) {
        return Err(SimError::InvalidParameter {
            what: "dt must be positive",
        });
    }
    let tau = plant.time_constant;
    let damping_term = 2.0 * plant.damping / (tau * dt);
    let inv_dt2 = 1.0 / (dt * dt);
    Ok(DiscretizationCoefficients {
        c0: inv_dt2 + damping_term + 1.0 / (tau * tau),
        c1: -2.0 * inv_dt2 - damping_term,
        c2: inv_dt2,
    })
}

/// A plant bound to its step size, ready to advance the recurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscretePlant {
    params: PlantParameters,
    coeffs: DiscretizationCoefficients,
}

impl DiscretePlant {
    pub fn new(params: PlantParameters, dt: f64) -> SimResult<Self> {
        let coeffs = discretize(&params, dt)?;
        Ok(Self { params, coeffs })
    }

    /// Next output from the two previous outputs, the input and the bias.
    pub fn step(&self, y_prev: f64, y_prev2: f64, input: f64, bias: f64) -> f64 {
        let DiscretizationCoefficients { c0, c1, c2 } = self.coeffs;
        let inv_tau2 = 1.0 / (self.params.time_constant * self.params.time_constant);
        (-c1 * y_prev - c2 * y_prev2 + self.params.gain * inv_tau2 * input + inv_tau2 * bias) / c0
    }

    /// Open-loop response to `inputs`, seeded with `y[0] = y[1] = initial`.
    pub fn response(&self, inputs: &[f64], initial: f64, bias: f64) -> Vec<f64> {
        let mut y = vec![initial; inputs.len()];
        for k in 2..inputs.len() {
            y[k] = self.step(y[k - 1], y[k - 2], inputs[k], bias);
        }
        y
    }
}
