//! Sampled PID controller.
//!
//! One controller type covers every variant used by the loops:
//! - integration by trapezoid or rectangle ([`IntegrationRule`])
//! - derivative of the error, or a smoothed derivative of the measurement
//!   ([`DerivativeMode`])
//!
//! All variants clamp the output to [`OutputLimits`] and use conditional
//! anti-windup: on a saturated step the integral keeps its pre-step value.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

/// PID gains. Fixed for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PIDGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PIDGains {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    /// Proportional-only gains.
    pub fn proportional(kp: f64) -> Self {
        Self::new(kp, 0.0, 0.0)
    }

    fn validate(&self) -> ControlResult<()> {
        if !(self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()) {
            return Err(ControlError::InvalidParameter {
                what: "gains must be finite",
            });
        }
        Ok(())
    }
}

/// Actuator saturation band `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputLimits {
    pub min: f64,
    pub max: f64,
}

impl OutputLimits {
    /// Create a saturation band. Infinite bounds are allowed.
    pub fn new(min: f64, max: f64) -> ControlResult<Self> {
        let limits = Self { min, max };
        limits.validate()?;
        Ok(limits)
    }

    /// No saturation.
    pub fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    pub fn validate(&self) -> ControlResult<()> {
        if self.min.is_nan() || self.max.is_nan() {
            return Err(ControlError::InvalidParameter {
                what: "output limits must not be NaN",
            });
        }
        if self.min >= self.max {
            return Err(ControlError::InvalidParameter {
                what: "out_min must be less than out_max",
            });
        }
        Ok(())
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// True when `value` sits on (or beyond) either bound.
    pub fn is_saturated(&self, value: f64) -> bool {
        value >= self.max || value <= self.min
    }
}

impl Default for OutputLimits {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Source of the derivative term.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DerivativeMode {
    /// `D = Kd · (e − e_prev) / dt`
    #[default]
    OnError,
    /// `d = α·d + (1 − α)·(pv − pv_prev) / dt`, `D = −Kd · d`
    OnMeasurement { smoothing: f64 },
}

impl DerivativeMode {
    pub const DEFAULT_SMOOTHING: f64 = 0.8;

    /// Smoothed derivative-on-measurement with the default factor.
    pub fn filtered_measurement() -> Self {
        Self::OnMeasurement {
            smoothing: Self::DEFAULT_SMOOTHING,
        }
    }

    fn validate(&self) -> ControlResult<()> {
        match self {
            Self::OnMeasurement { smoothing } if !(0.0..1.0).contains(smoothing) => {
                Err(ControlError::InvalidParameter {
                    what: "derivative smoothing must be in [0, 1)",
                })
            }
            _ => Ok(()),
        }
    }
}

/// Numerical rule for the integral increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationRule {
    /// `(e + e_prev) · dt / 2`
    #[default]
    Trapezoidal,
    /// `e · dt`
    Rectangular,
}

impl IntegrationRule {
    pub fn increment(self, error: f64, previous_error: f64, dt: f64) -> f64 {
        match self {
            Self::Trapezoidal => (error + previous_error) * dt / 2.0,
            Self::Rectangular => error * dt,
        }
    }
}

/// PID controller state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PIDControllerState {
    /// Integral accumulator.
    pub integral: f64,
    /// Error seen on the previous step (0 before the first step).
    pub previous_error: f64,
    /// Measurement seen on the previous step; `None` until the first step.
    pub previous_measurement: Option<f64>,
    /// Smoothed measurement derivative (derivative-on-measurement only).
    pub filtered_derivative: f64,
}

/// Stateful PID controller.
#[derive(Debug, Clone, PartialEq)]
pub struct PIDController {
    gains: PIDGains,
    limits: OutputLimits,
    derivative: DerivativeMode,
    integration: IntegrationRule,
    state: PIDControllerState,
}

impl PIDController {
    /// Controller with derivative-on-error and trapezoidal integration.
    pub fn new(gains: PIDGains, limits: OutputLimits) -> ControlResult<Self> {
        Self::with_modes(
            gains,
            limits,
            DerivativeMode::default(),
            IntegrationRule::default(),
        )
    }

    /// Controller with explicit derivative and integration variants.
    ///
    /// # Errors
    ///
    /// [`ControlError::InvalidParameter`] for non-finite gains, an empty
    /// saturation band, or a smoothing factor outside `[0, 1)`.
    pub fn with_modes(
        gains: PIDGains,
        limits: OutputLimits,
        derivative: DerivativeMode,
        integration: IntegrationRule,
    ) -> ControlResult<Self> {
        gains.validate()?;
        limits.validate()?;
        derivative.validate()?;
        Ok(Self {
            gains,
            limits,
            derivative,
            integration,
            state: PIDControllerState::default(),
        })
    }

    pub fn state(&self) -> &PIDControllerState {
        &self.state
    }

    /// Back to the initial state (zero integral, no history).
    pub fn reset(&mut self) {
        self.state = PIDControllerState::default();
    }

    /// Compute the saturated control for one sample.
    ///
    /// # Arguments
    ///
    /// * `setpoint` - Desired value
    /// * `measurement` - Process variable
    /// * `dt` - Sample period (seconds)
    pub fn step(&mut self, setpoint: f64, measurement: f64, dt: f64) -> ControlResult<f64> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(ControlError::InvalidParameter {
                what: "dt must be positive",
            });
        }
        let PIDGains { kp, ki, kd } = self.gains;

        // Error: positive when the measurement is below the setpoint
        let error = setpoint - measurement;

        let p_term = kp * error;

        let increment = self
            .integration
            .increment(error, self.state.previous_error, dt);
        let integral = self.state.integral + increment;
        let i_term = ki * integral;

        let d_term = match self.derivative {
            DerivativeMode::OnError => kd * (error - self.state.previous_error) / dt,
            DerivativeMode::OnMeasurement { smoothing } => {
                let previous = self.state.previous_measurement.unwrap_or(measurement);
                let rate = (measurement - previous) / dt;
                let filtered =
                    smoothing * self.state.filtered_derivative + (1.0 - smoothing) * rate;
                self.state.filtered_derivative = filtered;
                -kd * filtered
            }
        };

        let output_raw = p_term + i_term + d_term;
        let output = self.limits.clamp(output_raw);

        // Anti-windup: a saturated step does not accumulate
        if !self.limits.is_saturated(output) {
            self.state.integral = integral;
        }
        self.state.previous_error = error;
        self.state.previous_measurement = Some(measurement);

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn limits(min: f64, max: f64) -> OutputLimits {
        OutputLimits::new(min, max).unwrap()
    }

    #[test]
    fn limits_must_be_ordered() {
        assert!(OutputLimits::new(0.0, 1.0).is_ok());
        assert_eq!(
            OutputLimits::new(1.0, 1.0),
            Err(ControlError::InvalidParameter {
                what: "out_min must be less than out_max"
            })
        );
        assert!(OutputLimits::new(2.0, 1.0).is_err());
        assert!(OutputLimits::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn invalid_controller_config() {
        let bad_gains = PIDGains::new(f64::NAN, 0.0, 0.0);
        assert!(PIDController::new(bad_gains, OutputLimits::unbounded()).is_err());

        let bad_smoothing = DerivativeMode::OnMeasurement { smoothing: 1.0 };
        assert!(
            PIDController::with_modes(
                PIDGains::proportional(1.0),
                OutputLimits::unbounded(),
                bad_smoothing,
                IntegrationRule::Trapezoidal,
            )
            .is_err()
        );
    }

    #[test]
    fn non_positive_dt_is_rejected() {
        let mut pid = PIDController::new(PIDGains::proportional(1.0), limits(-1.0, 1.0)).unwrap();
        assert!(pid.step(1.0, 0.0, 0.0).is_err());
        assert!(pid.step(1.0, 0.0, -0.1).is_err());
        assert_eq!(pid.state(), &PIDControllerState::default());
    }

    #[test]
    fn proportional_only() {
        let mut pid = PIDController::new(PIDGains::proportional(2.0), limits(-10.0, 10.0)).unwrap();
        let u = pid.step(5.0, 4.0, 0.1).unwrap();
        assert_eq!(u, 2.0);
    }

    #[test]
    fn trapezoidal_integral_action() {
        let mut pid =
            PIDController::new(PIDGains::new(0.0, 1.0, 0.0), limits(-100.0, 100.0)).unwrap();
        // First step integrates from the zero initial error
        assert_relative_eq!(pid.step(1.0, 0.0, 1.0).unwrap(), 0.5);
        assert_relative_eq!(pid.step(1.0, 0.0, 1.0).unwrap(), 1.5);
        assert_relative_eq!(pid.state().integral, 1.5);
    }

    #[test]
    fn rectangular_integral_action() {
        let mut pid = PIDController::with_modes(
            PIDGains::new(0.0, 1.0, 0.0),
            limits(-100.0, 100.0),
            DerivativeMode::OnError,
            IntegrationRule::Rectangular,
        )
        .unwrap();
        assert_relative_eq!(pid.step(1.0, 0.0, 0.5).unwrap(), 0.5);
        assert_relative_eq!(pid.step(1.0, 0.0, 0.5).unwrap(), 1.0);
    }

    #[test]
    fn derivative_on_error_kicks_on_setpoint_change() {
        let mut pid =
            PIDController::new(PIDGains::new(0.0, 0.0, 1.0), limits(-100.0, 100.0)).unwrap();
        // e jumps from 0 to 2 over dt = 0.5
        assert_relative_eq!(pid.step(2.0, 0.0, 0.5).unwrap(), 4.0);
        // constant error, no derivative
        assert_relative_eq!(pid.step(2.0, 0.0, 0.5).unwrap(), 0.0);
    }

    #[test]
    fn derivative_on_measurement_ignores_setpoint_and_smooths() {
        let mut pid = PIDController::with_modes(
            PIDGains::new(0.0, 0.0, 1.0),
            limits(-100.0, 100.0),
            DerivativeMode::filtered_measurement(),
            IntegrationRule::Trapezoidal,
        )
        .unwrap();
        // First sample: no history, no derivative even with a setpoint jump
        assert_eq!(pid.step(10.0, 1.0, 0.1).unwrap(), 0.0);
        // Measurement rises by 1 over 0.1 s: rate 10, filtered 0.2 * 10 = 2
        assert_relative_eq!(pid.step(10.0, 2.0, 0.1).unwrap(), -2.0, epsilon = 1e-12);
        assert_relative_eq!(pid.state().filtered_derivative, 2.0, epsilon = 1e-12);
        // Flat measurement: filter decays 0.8 * 2
        assert_relative_eq!(pid.step(10.0, 2.0, 0.1).unwrap(), -1.6, epsilon = 1e-12);
    }

    #[test]
    fn output_saturates_and_integral_holds() {
        let mut pid = PIDController::new(PIDGains::new(10.0, 5.0, 0.0), limits(0.0, 1.0)).unwrap();
        let u = pid.step(10.0, 0.0, 0.1).unwrap();
        assert_eq!(u, 1.0);
        assert_eq!(pid.state().integral, 0.0);

        let u = pid.step(-10.0, 0.0, 0.1).unwrap();
        assert_eq!(u, 0.0);
        assert_eq!(pid.state().integral, 0.0);
    }

    #[test]
    fn unsaturated_step_accumulates() {
        let mut pid = PIDController::new(PIDGains::new(0.1, 1.0, 0.0), limits(-5.0, 5.0)).unwrap();
        pid.step(1.0, 0.0, 0.1).unwrap();
        assert_relative_eq!(pid.state().integral, 0.05);
    }

    #[test]
    fn reset_clears_history() {
        let mut pid = PIDController::new(PIDGains::new(1.0, 1.0, 1.0), limits(-5.0, 5.0)).unwrap();
        pid.step(1.0, 0.0, 0.1).unwrap();
        assert_ne!(pid.state(), &PIDControllerState::default());
        pid.reset();
        assert_eq!(pid.state(), &PIDControllerState::default());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn output_always_within_limits(
            kp in -20.0_f64..20.0,
            ki in -20.0_f64..20.0,
            kd in -5.0_f64..5.0,
            lo in -50.0_f64..0.0,
            width in 0.1_f64..100.0,
            dt in 0.001_f64..1.0,
            samples in prop::collection::vec((-100.0_f64..100.0, -100.0_f64..100.0), 1..40),
            on_measurement in any::<bool>(),
        ) {
            let derivative = if on_measurement {
                DerivativeMode::filtered_measurement()
            } else {
                DerivativeMode::OnError
            };
            let limits = OutputLimits::new(lo, lo + width).unwrap();
            let mut pid = PIDController::with_modes(
                PIDGains::new(kp, ki, kd),
                limits,
                derivative,
                IntegrationRule::Trapezoidal,
            )
            .unwrap();
            for (sp, pv) in samples {
                let u = pid.step(sp, pv, dt).unwrap();
                prop_assert!(u >= limits.min && u <= limits.max);
            }
        }

        #[test]
        fn saturated_step_keeps_integral(
            kp in 0.0_f64..10.0,
            ki in 0.0_f64..10.0,
            dt in 0.001_f64..0.5,
            samples in prop::collection::vec((-50.0_f64..50.0, -50.0_f64..50.0), 1..40),
            rectangular in any::<bool>(),
        ) {
            let rule = if rectangular {
                IntegrationRule::Rectangular
            } else {
                IntegrationRule::Trapezoidal
            };
            let limits = OutputLimits::new(-1.0, 1.0).unwrap();
            let mut pid = PIDController::with_modes(
                PIDGains::new(kp, ki, 0.0),
                limits,
                DerivativeMode::OnError,
                rule,
            )
            .unwrap();
            for (sp, pv) in samples {
                let before = pid.state().integral;
                let u = pid.step(sp, pv, dt).unwrap();
                if limits.is_saturated(u) {
                    prop_assert_eq!(pid.state().integral, before);
                }
            }
        }
    }
}
