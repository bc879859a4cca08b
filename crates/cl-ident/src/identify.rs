//! End-to-end identification: fit, recover, re-simulate, score.

use crate::arx::{ArxModel, ArxOrders};
use crate::continuous::ContinuousModel;
use crate::error::{IdentError, IdentResult};
use crate::validation::ValidationMetrics;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Identification settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifyOptions {
    pub orders: ArxOrders,
    /// Fraction of the record (at the end) kept out of the fit and used for
    /// scoring. 0 fits and scores on the full record.
    pub holdout_fraction: f64,
}

impl Default for IdentifyOptions {
    fn default() -> Self {
        Self {
            orders: ArxOrders::default(),
            holdout_fraction: 0.0,
        }
    }
}

impl IdentifyOptions {
    pub fn validate(&self) -> IdentResult<()> {
        self.orders.validate()?;
        if !(0.0..1.0).contains(&self.holdout_fraction) {
            return Err(IdentError::InvalidParameter {
                what: "holdout fraction must be in [0, 1)",
            });
        }
        Ok(())
    }
}

/// Result of [`identify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    pub model: ArxModel,
    /// Present for the (na = 2, nb = 1) structure.
    pub continuous: Option<ContinuousModel>,
    /// Open-loop response of `model` over the whole record.
    pub simulated: Vec<f64>,
    pub metrics: ValidationMetrics,
    /// Samples used for the fit (a prefix of the record).
    pub fit_samples: usize,
    /// First sample scored by `metrics`.
    pub validation_start: usize,
}

/// Identify an ARX model from `input`/`output` sampled every `dt` seconds.
///
/// # Errors
///
/// Input checks, a singular normal-equation system, or
/// [`IdentError::DegenerateModel`] when the second-order fit has no
/// continuous counterpart.
pub fn identify(
    input: &[f64],
    output: &[f64],
    dt: f64,
    options: &IdentifyOptions,
) -> IdentResult<Identification> {
    options.validate()?;
    if input.len() != output.len() {
        return Err(IdentError::LengthMismatch {
            what: "input/output records",
            left: input.len(),
            right: output.len(),
        });
    }
    let n = output.len();
    let holdout = (n as f64 * options.holdout_fraction).floor() as usize;
    let fit_samples = n - holdout;

    let orders = options.orders;
    let model = ArxModel::fit(&output[..fit_samples], &input[..fit_samples], &orders)?;

    let continuous = if orders.na == 2 && orders.nb == 1 {
        Some(ContinuousModel::from_arx(&model, dt)?)
    } else {
        None
    };

    let simulated = model.simulate(input, output)?;
    let validation_start = if holdout > 0 { fit_samples } else { 0 };
    let metrics =
        ValidationMetrics::compare(&output[validation_start..], &simulated[validation_start..])?;

    if let Some(c) = &continuous {
        debug!(
            gain = c.gain,
            tau = c.time_constant,
            zeta = c.damping,
            "continuous model recovered"
        );
    }
    info!(
        r_squared = metrics.r_squared,
        rmse = metrics.rmse,
        fit = metrics.fit_percent,
        fit_samples,
        "identification complete"
    );

    Ok(Identification {
        model,
        continuous,
        simulated,
        metrics,
        fit_samples,
        validation_start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(n: usize) -> (Vec<f64>, Vec<f64>) {
        let u: Vec<f64> = (0..n)
            .map(|k| {
                let k = k as f64;
                (1.3 * k).sin() + 0.5 * (0.37 * k * k).cos()
            })
            .collect();
        let mut y = vec![0.0; n];
        for k in 2..n {
            y[k] = 1.5 * y[k - 1] - 0.7 * y[k - 2] + 0.5 * u[k - 1];
        }
        (u, y)
    }

    #[test]
    fn exact_record_scores_perfectly() {
        let (u, y) = record(400);
        let id = identify(&u, &y, 0.01, &IdentifyOptions::default()).unwrap();
        assert_relative_eq!(id.metrics.r_squared, 1.0, epsilon = 1e-9);
        assert!(id.metrics.rmse < 1e-9);
        let c = id.continuous.unwrap();
        assert_relative_eq!(c.gain, 2.5, epsilon = 1e-6);
        assert_eq!(id.fit_samples, 400);
        assert_eq!(id.validation_start, 0);
    }

    #[test]
    fn holdout_scores_the_tail() {
        let (u, y) = record(400);
        let opts = IdentifyOptions {
            holdout_fraction: 0.25,
            ..IdentifyOptions::default()
        };
        let id = identify(&u, &y, 0.01, &opts).unwrap();
        assert_eq!(id.fit_samples, 300);
        assert_eq!(id.validation_start, 300);
        assert_eq!(id.simulated.len(), 400);
        assert_relative_eq!(id.metrics.r_squared, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn other_structures_skip_continuous_recovery() {
        let (u, y) = record(200);
        let opts = IdentifyOptions {
            orders: ArxOrders::new(2, 2, 1).unwrap(),
            ..IdentifyOptions::default()
        };
        let id = identify(&u, &y, 0.01, &opts).unwrap();
        assert!(id.continuous.is_none());
        assert_eq!(id.model.a.len(), 2);
        assert_eq!(id.model.b.len(), 2);
        assert!(id.model.b[1].abs() < 1e-9);
    }

    #[test]
    fn option_checks() {
        let (u, y) = record(50);
        let opts = IdentifyOptions {
            holdout_fraction: 1.0,
            ..IdentifyOptions::default()
        };
        assert!(identify(&u, &y, 0.01, &opts).is_err());
        assert!(matches!(
            identify(&u[..10], &y, 0.01, &IdentifyOptions::default()),
            Err(IdentError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn unphysical_second_order_fit_is_degenerate() {
        // a1 = 0.5, a2 = -0.8: den0 = 0.7 but 1 - a1 + a2 = -0.3, so tau^2 < 0
        let n = 80;
        let u: Vec<f64> = (0..n)
            .map(|k| {
                let k = k as f64;
                (1.3 * k).sin() + 0.5 * (0.37 * k * k).cos()
            })
            .collect();
        let mut y = vec![0.0; n];
        for k in 2..n {
            y[k] = -0.5 * y[k - 1] + 0.8 * y[k - 2] + 0.5 * u[k - 1];
        }
        assert!(matches!(
            identify(&u, &y, 0.01, &IdentifyOptions::default()),
            Err(IdentError::DegenerateModel { .. })
        ));
    }
}
