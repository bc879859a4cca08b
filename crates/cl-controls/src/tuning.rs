//! Analytic PID design by pole placement.
//!
//! With the plant `K / (τ²s² + 2ζτs + 1)` and an ideal PID, the closed-loop
//! characteristic polynomial is
//!
//! ```text
//! τ²s³ + (2ζτ + K·Kd)s² + (1 + K·Kp)s + K·Ki
//! ```
//!
//! Dividing by τ² and matching against `(s − p1)(s − p2)(s + p_extra)` gives
//! the gains in closed form.

use crate::controller::PIDGains;
use crate::error::{ControlError, ControlResult};
use cl_core::{PlantParameters, Pole};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// `|ζ − 1|` below this counts as critically damped.
const CRITICAL_DAMPING_TOL: f64 = 1e-12;

/// Desired closed-loop dynamics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignTarget {
    /// Desired damping ratio ζ_d (>= 0).
    pub damping: f64,
    /// Desired natural frequency ω_n in rad/s (> 0).
    pub natural_frequency: f64,
}

impl DesignTarget {
    pub fn new(damping: f64, natural_frequency: f64) -> ControlResult<Self> {
        let target = Self {
            damping,
            natural_frequency,
        };
        target.validate()?;
        Ok(target)
    }

    pub fn validate(&self) -> ControlResult<()> {
        if !(self.damping.is_finite() && self.natural_frequency.is_finite()) {
            return Err(ControlError::InvalidParameter {
                what: "design target must be finite",
            });
        }
        if self.damping < 0.0 {
            return Err(ControlError::InvalidParameter {
                what: "desired damping must be non-negative",
            });
        }
        if self.natural_frequency <= 0.0 {
            return Err(ControlError::InvalidParameter {
                what: "natural frequency must be positive",
            });
        }
        Ok(())
    }

    pub fn regime(&self) -> DampingRegime {
        if (self.damping - 1.0).abs() <= CRITICAL_DAMPING_TOL {
            DampingRegime::Critical
        } else if self.damping < 1.0 {
            DampingRegime::Underdamped
        } else {
            DampingRegime::Overdamped
        }
    }

    /// Dominant pole pair for this target.
    pub fn dominant_poles(&self) -> [Pole; 2] {
        let zeta = self.damping;
        let wn = self.natural_frequency;
        match self.regime() {
            DampingRegime::Underdamped => {
                let re = -zeta * wn;
                let im = wn * (1.0 - zeta * zeta).sqrt();
                [Pole::new(re, im), Pole::new(re, -im)]
            }
            DampingRegime::Critical => [Pole::real(-wn), Pole::real(-wn)],
            DampingRegime::Overdamped => {
                let spread = wn * (zeta * zeta - 1.0).sqrt();
                [Pole::real(-zeta * wn + spread), Pole::real(-zeta * wn - spread)]
            }
        }
    }

    /// Magnitude of the third, non-dominant pole (placed at `−p_extra`).
    ///
    /// 5 × the largest |Re| when underdamped, ω_n when critical and
    /// 2 × the smallest |Re| when overdamped.
    pub fn extra_pole(&self) -> f64 {
        let [p1, p2] = self.dominant_poles();
        let (a, b) = (p1.re.abs(), p2.re.abs());
        match self.regime() {
            DampingRegime::Underdamped => 5.0 * a.max(b),
            DampingRegime::Critical => a.max(b),
            DampingRegime::Overdamped => 2.0 * a.min(b),
        }
    }
}

/// Damping regime of a design target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DampingRegime {
    Underdamped,
    Critical,
    Overdamped,
}

/// Minimum gains substituted when the analytic value falls below them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainFloors {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Default for GainFloors {
    fn default() -> Self {
        Self {
            kp: 0.1,
            ki: 0.01,
            kd: 0.01,
        }
    }
}

/// Outcome of a pole-placement design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoleTuning {
    pub target: DesignTarget,
    pub dominant_poles: [Pole; 2],
    pub extra_pole: f64,
    /// Desired monic cubic `[a2, a1, a0]` (the s³ coefficient is 1).
    pub desired_polynomial: [f64; 3],
    /// Gains straight from coefficient matching.
    pub analytic_gains: PIDGains,
    /// Gains after the floors.
    pub gains: PIDGains,
    /// Which of (kp, ki, kd) were replaced by their floor.
    pub floored: [bool; 3],
}

impl PoleTuning {
    pub fn any_floored(&self) -> bool {
        self.floored.iter().any(|f| *f)
    }
}

/// Pole-placement tuner.
#[derive(Debug, Clone, Default)]
pub struct PoleTuner {
    floors: GainFloors,
}

impl PoleTuner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_floors(mut self, floors: GainFloors) -> Self {
        self.floors = floors;
        self
    }

    /// Full PID design for `plant` so that the closed loop has the target's
    /// dominant poles plus the extra pole.
    pub fn tune(&self, plant: &PlantParameters, target: &DesignTarget) -> ControlResult<PoleTuning> {
        plant.validate()?;
        target.validate()?;

        let dominant_poles = target.dominant_poles();
        let extra_pole = target.extra_pole();
        let desired_polynomial = expand_with_extra_pole(dominant_poles, extra_pole);
        let [a2, a1, a0] = desired_polynomial;

        let k = plant.gain;
        let tau = plant.time_constant;
        let tau2 = tau * tau;
        let analytic_gains = PIDGains {
            kp: (a1 * tau2 - 1.0) / k,
            ki: a0 * tau2 / k,
            kd: (a2 * tau2 - 2.0 * plant.damping * tau) / k,
        };

        let (gains, floored) = self.apply_floors(analytic_gains, true);
        if floored.iter().any(|f| *f) {
            warn!(
                zeta = target.damping,
                wn = target.natural_frequency,
                kp = analytic_gains.kp,
                ki = analytic_gains.ki,
                kd = analytic_gains.kd,
                "pole placement gains below floor; floors substituted"
            );
        }
        debug!(
            kp = gains.kp,
            ki = gains.ki,
            kd = gains.kd,
            extra_pole,
            "pole placement complete"
        );

        Ok(PoleTuning {
            target: *target,
            dominant_poles,
            extra_pole,
            desired_polynomial,
            analytic_gains,
            gains,
            floored,
        })
    }

    /// Simplified PI design used on identified models:
    /// `Kp = (2ζ_d·ω_n·τ − 1)/K`, `Ki = ω_n²τ²/K`, `Kd = 0`.
    ///
    /// The identified gain may be negative, so this takes raw numbers
    /// instead of validated [`PlantParameters`].
    pub fn tune_identified_pi(
        &self,
        gain: f64,
        time_constant: f64,
        target: &DesignTarget,
    ) -> ControlResult<PIDGains> {
        target.validate()?;
        if !(gain.is_finite() && gain != 0.0 && time_constant.is_finite()) {
            return Err(ControlError::InvalidParameter {
                what: "identified model must have a finite non-zero gain",
            });
        }
        let wn = target.natural_frequency;
        let analytic = PIDGains {
            kp: (2.0 * target.damping * wn * time_constant - 1.0) / gain,
            ki: wn * wn * time_constant * time_constant / gain,
            kd: 0.0,
        };
        let (gains, floored) = self.apply_floors(analytic, false);
        if floored.iter().any(|f| *f) {
            debug!(kp = analytic.kp, ki = analytic.ki, "PI design floored");
        }
        Ok(gains)
    }

    fn apply_floors(&self, gains: PIDGains, with_derivative: bool) -> (PIDGains, [bool; 3]) {
        let floor = |value: f64, min: f64| {
            if value < min { (min, true) } else { (value, false) }
        };
        let (kp, kp_floored) = floor(gains.kp, self.floors.kp);
        let (ki, ki_floored) = floor(gains.ki, self.floors.ki);
        let (kd, kd_floored) = if with_derivative {
            floor(gains.kd, self.floors.kd)
        } else {
            (gains.kd, false)
        };
        (
            PIDGains { kp, ki, kd },
            [kp_floored, ki_floored, kd_floored],
        )
    }
}

/// Monic coefficients `[a2, a1, a0]` of `(s − p1)(s − p2)(s + extra)`.
///
/// `p1, p2` must be a conjugate pair or two real poles so the product is
/// real.
pub fn expand_with_extra_pole(poles: [Pole; 2], extra: f64) -> [f64; 3] {
    let [p1, p2] = poles;
    let sum = p1.re + p2.re;
    let product = p1.re * p2.re - p1.im * p2.im;
    [extra - sum, product - sum * extra, product * extra]
}

/// Closed-loop characteristic coefficients `[τ², 2ζτ + K·Kd, 1 + K·Kp, K·Ki]`
/// of the plant under ideal PID control, highest power first.
pub fn closed_loop_coefficients(plant: &PlantParameters, gains: &PIDGains) -> [f64; 4] {
    let k = plant.gain;
    let tau = plant.time_constant;
    [
        tau * tau,
        2.0 * plant.damping * tau + k * gains.kd,
        1.0 + k * gains.kp,
        k * gains.ki,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_plant() -> PlantParameters {
        PlantParameters::new(1.0, 1.0, 0.5).unwrap()
    }

    #[test]
    fn invalid_targets_are_rejected() {
        assert!(DesignTarget::new(0.7, 0.0).is_err());
        assert!(DesignTarget::new(0.7, -1.0).is_err());
        assert!(DesignTarget::new(-0.1, 1.0).is_err());
        assert!(DesignTarget::new(f64::NAN, 1.0).is_err());
        assert!(DesignTarget::new(0.0, 1.0).is_ok());
    }

    #[test]
    fn regimes() {
        assert_eq!(
            DesignTarget::new(0.3, 1.0).unwrap().regime(),
            DampingRegime::Underdamped
        );
        assert_eq!(
            DesignTarget::new(1.0, 1.0).unwrap().regime(),
            DampingRegime::Critical
        );
        assert_eq!(
            DesignTarget::new(1.1, 1.0).unwrap().regime(),
            DampingRegime::Overdamped
        );
    }

    #[test]
    fn underdamped_extra_pole_is_five_times_real_part() {
        let target = DesignTarget::new(0.5, 2.0).unwrap();
        let [p1, p2] = target.dominant_poles();
        assert_relative_eq!(p1.re, -1.0);
        assert_relative_eq!(p1.im, 3.0_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(p2.im, -p1.im);
        assert_relative_eq!(target.extra_pole(), 5.0);
    }

    #[test]
    fn overdamped_extra_pole_is_twice_slowest() {
        let target = DesignTarget::new(1.25, 1.0).unwrap();
        let [p1, p2] = target.dominant_poles();
        assert_relative_eq!(p1.re, -0.5, epsilon = 1e-12);
        assert_relative_eq!(p2.re, -2.0, epsilon = 1e-12);
        assert_relative_eq!(target.extra_pole(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn overdamped_expansion_keeps_signs() {
        let (zeta, wn) = (1.1, 0.4);
        let target = DesignTarget::new(zeta, wn).unwrap();
        let extra = target.extra_pole();
        assert_relative_eq!(extra, 0.513394, epsilon = 1e-6);

        let [a2, a1, a0] = expand_with_extra_pole(target.dominant_poles(), extra);
        assert_relative_eq!(a2, extra + 2.0 * zeta * wn, epsilon = 1e-12);
        assert_relative_eq!(a1, wn * wn + 2.0 * zeta * wn * extra, epsilon = 1e-12);
        assert_relative_eq!(a0, wn * wn * extra, epsilon = 1e-12);
        assert_relative_eq!(a2, 1.393394, epsilon = 1e-6);
    }

    #[test]
    fn expansion_matches_underdamped_closed_form() {
        let (zeta, wn, extra) = (0.3, 0.8, 1.2);
        let target = DesignTarget::new(zeta, wn).unwrap();
        let [a2, a1, a0] = expand_with_extra_pole(target.dominant_poles(), extra);
        assert_relative_eq!(a2, extra + 2.0 * zeta * wn, epsilon = 1e-12);
        assert_relative_eq!(a1, wn * wn + 2.0 * zeta * wn * extra, epsilon = 1e-12);
        assert_relative_eq!(a0, wn * wn * extra, epsilon = 1e-12);
    }

    #[test]
    fn critical_design_on_unit_plant() {
        let target = DesignTarget::new(1.0, 0.6).unwrap();
        let tuning = PoleTuner::new().tune(&unit_plant(), &target).unwrap();

        assert_relative_eq!(tuning.extra_pole, 0.6, epsilon = 1e-12);
        let [a2, a1, a0] = tuning.desired_polynomial;
        assert_relative_eq!(a2, 1.8, epsilon = 1e-12);
        assert_relative_eq!(a1, 1.08, epsilon = 1e-12);
        assert_relative_eq!(a0, 0.216, epsilon = 1e-12);

        assert_relative_eq!(tuning.analytic_gains.kd, 0.8, epsilon = 1e-12);
        assert_relative_eq!(tuning.analytic_gains.kp, 0.08, epsilon = 1e-12);
        assert_relative_eq!(tuning.analytic_gains.ki, 0.216, epsilon = 1e-12);

        // kp below its floor
        assert_eq!(tuning.floored, [true, false, false]);
        assert_eq!(tuning.gains.kp, 0.1);
        assert!(tuning.gains.kp > 0.0 && tuning.gains.ki > 0.0 && tuning.gains.kd > 0.0);
    }

    #[test]
    fn unfloored_gains_place_the_poles() {
        let plant = PlantParameters::new(2.0, 1.5, 0.4).unwrap();
        let target = DesignTarget::new(0.7, 2.0).unwrap();
        let tuning = PoleTuner::new().tune(&plant, &target).unwrap();
        assert!(!tuning.any_floored());

        let [c3, c2, c1, c0] = closed_loop_coefficients(&plant, &tuning.gains);
        let [a2, a1, a0] = tuning.desired_polynomial;
        assert_relative_eq!(c2 / c3, a2, epsilon = 1e-10);
        assert_relative_eq!(c1 / c3, a1, epsilon = 1e-10);
        assert_relative_eq!(c0 / c3, a0, epsilon = 1e-10);
    }

    #[test]
    fn custom_floors() {
        let floors = GainFloors {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
        };
        let target = DesignTarget::new(1.0, 0.6).unwrap();
        let tuning = PoleTuner::new()
            .with_floors(floors)
            .tune(&unit_plant(), &target)
            .unwrap();
        assert!(!tuning.any_floored());
        assert_relative_eq!(tuning.gains.kp, 0.08, epsilon = 1e-12);
    }

    #[test]
    fn identified_pi_design() {
        let target = DesignTarget::new(1.0, 0.6).unwrap();
        let gains = PoleTuner::new()
            .tune_identified_pi(1.2, 1.5, &target)
            .unwrap();
        assert_relative_eq!(gains.kp, (2.0 * 0.6 * 1.5 - 1.0) / 1.2, epsilon = 1e-12);
        assert_relative_eq!(gains.ki, 0.36 * 2.25 / 1.2, epsilon = 1e-12);
        assert_eq!(gains.kd, 0.0);
    }

    #[test]
    fn identified_pi_floors_and_rejects_zero_gain() {
        let target = DesignTarget::new(0.7, 0.1).unwrap();
        let gains = PoleTuner::new()
            .tune_identified_pi(1.0, 0.5, &target)
            .unwrap();
        assert_eq!(gains.kp, 0.1);
        assert_eq!(gains.ki, 0.01);

        assert!(
            PoleTuner::new()
                .tune_identified_pi(0.0, 1.0, &target)
                .is_err()
        );
    }

    #[test]
    fn closed_loop_coefficients_of_unit_plant() {
        let coeffs = closed_loop_coefficients(&unit_plant(), &PIDGains::new(1.5, 1.0, 0.2));
        assert_eq!(coeffs, [1.0, 1.2, 2.5, 1.0]);
    }
}
