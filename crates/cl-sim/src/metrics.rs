//! Control loop performance metrics.
//!
//! Pure functions over a finished [`Trajectory`] (or its raw series).

use crate::trajectory::Trajectory;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Settling band as a fraction of |reference|.
pub const DEFAULT_SETTLING_FRACTION: f64 = 0.02;

/// Overshoot ratios at or below this count as no overshoot.
const NEGLIGIBLE_OVERSHOOT_RATIO: f64 = 0.001;

/// Floor for the observed damping when the response overshoots by 100 % or
/// more.
const MIN_OBSERVED_DAMPING: f64 = 0.01;

/// Standard control loop performance metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopMetrics {
    /// Integral of squared error, Σ e²·dt
    pub ise: f64,
    /// Time to enter and stay in the settling band (seconds)
    pub settling_time_s: f64,
    /// max(0, max(y) − reference)
    pub overshoot: f64,
    /// Overshoot in percent of |reference|
    pub overshoot_pct: f64,
    /// Damping ratio implied by the overshoot
    pub observed_damping: f64,
    /// |y[N−1] − reference|
    pub steady_state_error: f64,
    /// Final control value
    pub final_control: f64,
    /// Largest |u| over the run
    pub peak_control: f64,
}

impl LoopMetrics {
    /// Metrics with the default 2 % settling band.
    pub fn from_trajectory(traj: &Trajectory) -> Option<Self> {
        Self::with_settling_fraction(traj, DEFAULT_SETTLING_FRACTION)
    }

    /// Metrics with a settling band of `fraction · |reference|`.
    ///
    /// Returns `None` for an empty trajectory.
    pub fn with_settling_fraction(traj: &Trajectory, fraction: f64) -> Option<Self> {
        let reference = traj.reference();
        let tolerance = fraction * reference.abs();
        let over = overshoot(traj.output(), reference)?;
        let final_output = traj.final_output()?;
        Some(Self {
            ise: integral_squared_error(traj.error(), traj.dt()),
            settling_time_s: settling_time(traj.time(), traj.error(), tolerance)?,
            overshoot: over,
            overshoot_pct: 100.0 * over / reference.abs(),
            observed_damping: observed_damping(over, reference),
            steady_state_error: (final_output - reference).abs(),
            final_control: traj.final_control()?,
            peak_control: traj.control().iter().fold(0.0, |acc, u| acc.max(u.abs())),
        })
    }
}

/// ISE = Σ e[k]²·dt.
pub fn integral_squared_error(error: &[f64], dt: f64) -> f64 {
    error.iter().map(|e| e * e).sum::<f64>() * dt
}

/// Earliest `t[k]` such that `|e[j]| <= tolerance` for every `j >= k`.
///
/// Scans backward for the last violation. If the final sample is out of band
/// the final time is returned; with no violation at all, `t[0]`. `None` only
/// for empty input.
pub fn settling_time(time: &[f64], error: &[f64], tolerance: f64) -> Option<f64> {
    let n = time.len().min(error.len());
    if n == 0 {
        return None;
    }
    let last_violation = (0..n).rev().find(|&k| error[k].abs() > tolerance);
    Some(match last_violation {
        None => time[0],
        Some(k) if k == n - 1 => time[n - 1],
        Some(k) => time[k + 1],
    })
}

/// Forward-scan formulation of [`settling_time`]; always agrees with it.
pub fn settling_time_forward(time: &[f64], error: &[f64], tolerance: f64) -> Option<f64> {
    let n = time.len().min(error.len());
    if n == 0 {
        return None;
    }
    let mut entry: Option<usize> = None;
    for (k, e) in error.iter().take(n).enumerate() {
        if e.abs() > tolerance {
            entry = None;
        } else if entry.is_none() {
            entry = Some(k);
        }
    }
    Some(time[entry.unwrap_or(n - 1)])
}

/// max(0, max(output) − reference). `None` for empty output.
pub fn overshoot(output: &[f64], reference: f64) -> Option<f64> {
    let peak = output.iter().copied().reduce(f64::max)?;
    Some((peak - reference).max(0.0))
}

/// Damping ratio implied by an overshoot, from `Mp = overshoot / |reference|`:
///
/// ```text
/// ζ = √( ln²Mp / (π² + ln²Mp) )
/// ```
///
/// No (or negligible) overshoot gives 1.0; `Mp >= 1` gives 0.01.
pub fn observed_damping(overshoot: f64, reference: f64) -> f64 {
    if overshoot <= 0.0 {
        return 1.0;
    }
    let ratio = overshoot / reference.abs();
    if ratio <= NEGLIGIBLE_OVERSHOOT_RATIO {
        1.0
    } else if ratio >= 1.0 {
        MIN_OBSERVED_DAMPING
    } else {
        let ln = ratio.ln();
        (ln * ln / (PI * PI + ln * ln)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid(n: usize, dt: f64) -> Vec<f64> {
        (0..n).map(|k| k as f64 * dt).collect()
    }

    #[test]
    fn ise_sums_squared_error() {
        assert_relative_eq!(integral_squared_error(&[1.0, -2.0, 3.0], 0.5), 7.0);
        assert_eq!(integral_squared_error(&[], 0.5), 0.0);
    }

    #[test]
    fn settling_time_basic() {
        let t = grid(6, 1.0);
        let e = [5.0, 3.0, 0.5, 2.0, 0.1, 0.0];
        assert_eq!(settling_time(&t, &e, 1.0), Some(4.0));
        assert_eq!(settling_time_forward(&t, &e, 1.0), Some(4.0));
    }

    #[test]
    fn settling_time_edges() {
        let t = grid(4, 0.5);
        // Never leaves the band
        assert_eq!(settling_time(&t, &[0.0; 4], 0.1), Some(0.0));
        // Final sample out of band
        let e = [0.0, 0.0, 0.0, 1.0];
        assert_eq!(settling_time(&t, &e, 0.1), Some(1.5));
        assert_eq!(settling_time_forward(&t, &e, 0.1), Some(1.5));
        // Band edge counts as inside
        assert_eq!(settling_time(&t, &[1.0, 0.1, 0.1, 0.1], 0.1), Some(0.5));
        assert_eq!(settling_time(&[], &[], 0.1), None);
    }

    #[test]
    fn overshoot_is_clipped_at_zero() {
        assert_eq!(overshoot(&[0.0, 1.0, 0.9], 2.0), Some(0.0));
        assert_relative_eq!(overshoot(&[0.0, 2.5, 2.0], 2.0).unwrap(), 0.5);
        assert_eq!(overshoot(&[], 1.0), None);
    }

    #[test]
    fn observed_damping_sentinels() {
        assert_eq!(observed_damping(0.0, 10.0), 1.0);
        assert_eq!(observed_damping(0.005, 10.0), 1.0);
        assert_eq!(observed_damping(10.0, 10.0), 0.01);
        assert_eq!(observed_damping(1.0, 0.0), 0.01);
    }

    #[test]
    fn observed_damping_inverts_second_order_overshoot() {
        // Mp = exp(−πζ/√(1−ζ²)) for a pure second-order step response
        let zeta: f64 = 0.3;
        let mp = (-PI * zeta / (1.0 - zeta * zeta).sqrt()).exp();
        assert_relative_eq!(observed_damping(mp * 4.0, 4.0), zeta, epsilon = 1e-12);
    }

    #[test]
    fn metrics_from_trajectory() {
        let traj = Trajectory::new(
            2.0,
            0.5,
            vec![0.0, 1.0, 2.5, 2.0],
            vec![0.0, 3.0, -4.0, 1.0],
            vec![2.0, 1.0, -0.5, 0.0],
        );
        let m = LoopMetrics::from_trajectory(&traj).unwrap();
        assert_relative_eq!(m.ise, (4.0 + 1.0 + 0.25) * 0.5);
        assert_relative_eq!(m.overshoot, 0.5);
        assert_relative_eq!(m.overshoot_pct, 25.0);
        assert_eq!(m.settling_time_s, 1.5);
        assert_eq!(m.steady_state_error, 0.0);
        assert_eq!(m.final_control, 1.0);
        assert_eq!(m.peak_control, 4.0);
    }
}
