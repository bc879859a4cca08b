//! Discrete → continuous recovery for the second-order ARX structure.
//!
//! Bilinear-style mapping of `b1 / (z² + a1·z + a2)` at sample period T onto
//! s-domain denominator coefficients:
//!
//! ```text
//! den0 = 1 + a1 + a2
//! den1 = 2(1 − a2)/T
//! den2 = 4(1 − a1 + a2)/T²
//! ```
//!
//! which is matched against `K / (τ²s² + 2ζτs + 1)`.

use crate::arx::ArxModel;
use crate::error::{IdentError, IdentResult};
use cl_core::PlantParameters;
use serde::{Deserialize, Serialize};

/// Continuous parameters recovered from a fitted (na = 2, nb = 1) model.
///
/// `gain` and `damping` are reported as computed and may be negative for
/// an unstable or inverted fit; [`ContinuousModel::to_plant`] checks them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContinuousModel {
    pub gain: f64,
    pub time_constant: f64,
    pub damping: f64,
    /// `[den2, den1, den0]`, highest power first
    pub denominator: [f64; 3],
    /// `[num2, num1, num0]`, highest power first
    pub numerator: [f64; 3],
}

impl ContinuousModel {
    /// Bilinear recovery at sample period `dt`.
    ///
    /// # Errors
    ///
    /// - [`IdentError::InvalidParameter`] for a structure other than
    ///   na = 2, nb = 1 or a non-positive `dt`
    /// - [`IdentError::DegenerateModel`] if `den0 = 0`, `den2/den0 <= 0`,
    ///   or any result is non-finite
    pub fn from_arx(model: &ArxModel, dt: f64) -> IdentResult<Self> {
        if model.orders.na != 2 || model.orders.nb != 1 {
            return Err(IdentError::InvalidParameter {
                what: "continuous recovery needs na = 2, nb = 1",
            });
        }
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(IdentError::InvalidParameter {
                what: "dt must be positive",
            });
        }
        let (a1, a2, b1) = (model.a[0], model.a[1], model.b[0]);

        let den0 = 1.0 + a1 + a2;
        let den1 = 2.0 * (1.0 - a2) / dt;
        let den2 = 4.0 * (1.0 - a1 + a2) / (dt * dt);
        let num0 = b1;
        let num1 = 2.0 * b1 / dt;
        let num2 = 4.0 * b1 / (dt * dt);

        if den0 == 0.0 {
            return Err(IdentError::DegenerateModel {
                what: "pole at z = 1 (1 + a1 + a2 = 0)",
            });
        }
        let tau_squared = den2 / den0;
        if !(tau_squared > 0.0) {
            return Err(IdentError::DegenerateModel {
                what: "non-positive squared time constant",
            });
        }

        let gain = num0 / den0;
        let time_constant = tau_squared.sqrt();
        let damping = den1 / (2.0 * time_constant * den0);
        if !(gain.is_finite() && time_constant.is_finite() && damping.is_finite()) {
            return Err(IdentError::DegenerateModel {
                what: "non-finite continuous parameters",
            });
        }

        Ok(Self {
            gain,
            time_constant,
            damping,
            denominator: [den2, den1, den0],
            numerator: [num2, num1, num0],
        })
    }

    /// Validated plant parameters, for re-simulation or tuning.
    pub fn to_plant(&self) -> IdentResult<PlantParameters> {
        PlantParameters::new(self.gain, self.time_constant, self.damping).map_err(|_| {
            IdentError::DegenerateModel {
                what: "recovered parameters are not a valid plant",
            }
        })
    }
}
