//! Second-order process parameters.
//!
//! The controlled process is modeled as
//!
//! ```text
//!            K
//! G(s) = ----------------------
//!        τ²·s² + 2ζτ·s + 1
//! ```

use crate::error::CoreResult;
use crate::numeric::{ensure_non_negative, ensure_positive};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Continuous second-order plant `K / (τ²s² + 2ζτs + 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlantParameters {
    /// Static gain K (> 0).
    pub gain: f64,
    /// Time constant τ in seconds (> 0).
    pub time_constant: f64,
    /// Damping ratio ζ (>= 0).
    pub damping: f64,
}

impl PlantParameters {
    /// Create validated plant parameters.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError`] if `gain` or `time_constant` are not
    /// positive, `damping` is negative, or any value is non-finite.
    pub fn new(gain: f64, time_constant: f64, damping: f64) -> CoreResult<Self> {
        let params = Self {
            gain,
            time_constant,
            damping,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check the invariants; useful for values deserialized from config.
    pub fn validate(&self) -> CoreResult<()> {
        ensure_positive(self.gain, "plant gain must be positive")?;
        ensure_positive(self.time_constant, "time constant must be positive")?;
        ensure_non_negative(self.damping, "damping ratio must be non-negative")?;
        Ok(())
    }

    /// Denominator coefficients `[τ², 2ζτ, 1]`, highest power first.
    pub fn denominator(&self) -> [f64; 3] {
        let tau = self.time_constant;
        [tau * tau, 2.0 * self.damping * tau, 1.0]
    }

    /// Open-loop poles, the roots of `τ²s² + 2ζτs + 1`.
    pub fn poles(&self) -> [Pole; 2] {
        let [a, b, c] = self.denominator();
        let disc = b * b - 4.0 * a * c;
        if disc >= 0.0 {
            let root = disc.sqrt();
            [
                Pole::real((-b + root) / (2.0 * a)),
                Pole::real((-b - root) / (2.0 * a)),
            ]
        } else {
            let re = -b / (2.0 * a);
            let im = (-disc).sqrt() / (2.0 * a);
            [Pole::new(re, im), Pole::new(re, -im)]
        }
    }
}

/// A point in the complex s-plane.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pole {
    pub re: f64,
    pub im: f64,
}

impl Pole {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub fn real(re: f64) -> Self {
        Self { re, im: 0.0 }
    }

    pub fn is_real(&self) -> bool {
        self.im == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn valid_plant() {
        let p = PlantParameters::new(1.0, 1.0, 0.5).unwrap();
        assert_eq!(p.denominator(), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn zero_damping_is_allowed() {
        assert!(PlantParameters::new(1.0, 2.0, 0.0).is_ok());
    }

    #[test]
    fn invalid_plants_are_rejected() {
        assert!(PlantParameters::new(0.0, 1.0, 0.5).is_err());
        assert!(PlantParameters::new(1.0, 0.0, 0.5).is_err());
        assert!(PlantParameters::new(1.0, -1.0, 0.5).is_err());
        assert!(PlantParameters::new(1.0, 1.0, -0.1).is_err());
        assert!(PlantParameters::new(f64::NAN, 1.0, 0.5).is_err());
    }

    #[test]
    fn underdamped_poles_are_complex_pair() {
        let p = PlantParameters::new(1.0, 1.0, 0.5).unwrap();
        let [p1, p2] = p.poles();
        assert_relative_eq!(p1.re, -0.5, epsilon = 1e-12);
        assert_relative_eq!(p1.im, 0.75_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(p2.im, -p1.im);
        assert_relative_eq!(p1.re.hypot(p1.im), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn overdamped_poles_are_real() {
        let p = PlantParameters::new(1.0, 1.0, 1.25).unwrap();
        let [p1, p2] = p.poles();
        assert!(p1.is_real() && p2.is_real());
        assert_relative_eq!(p1.re, -0.5, epsilon = 1e-12);
        assert_relative_eq!(p2.re, -2.0, epsilon = 1e-12);
    }
}
