//! Fit quality of a simulated model against a measured record.

use crate::error::{IdentError, IdentResult};
use cl_core::{mean, sum_squared_diff};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// R², RMSE and NRMSE fit percentage.
///
/// R² and `fit_percent` are NaN when the measured record is constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub r_squared: f64,
    pub rmse: f64,
    pub fit_percent: f64,
}

impl ValidationMetrics {
    /// Compare `simulated` against `measured` sample by sample.
    pub fn compare(measured: &[f64], simulated: &[f64]) -> IdentResult<Self> {
        if measured.len() != simulated.len() {
            return Err(IdentError::LengthMismatch {
                what: "measured/simulated",
                left: measured.len(),
                right: simulated.len(),
            });
        }
        if measured.is_empty() {
            return Err(IdentError::TooFewSamples { needed: 1, got: 0 });
        }

        let n = measured.len() as f64;
        let y_mean = mean(measured);
        let sse = sum_squared_diff(measured, simulated)?;
        let sst: f64 = measured.iter().map(|y| (y - y_mean).powi(2)).sum();

        let (r_squared, fit_percent) = if sst == 0.0 {
            warn!("constant measured record; R² and fit are undefined");
            (f64::NAN, f64::NAN)
        } else {
            (1.0 - sse / sst, (1.0 - sse.sqrt() / sst.sqrt()) * 100.0)
        };

        Ok(Self {
            r_squared,
            rmse: (sse / n).sqrt(),
            fit_percent,
        })
    }
}
