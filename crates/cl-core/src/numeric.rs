use crate::CoreError;

/// Floating point type used throughout system
pub type Real = f64;

/// Slack used when deciding whether `t_end / dt` is a whole number of steps.
const STEP_RATIO_SLACK: Real = 1e-9;

/// Largest grid [`sample_count`] accepts.
pub const MAX_SAMPLE_COUNT: usize = 100_000_000;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Finite and strictly positive.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, CoreError> {
    ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(CoreError::InvalidParameter { what })
    }
}

/// Finite and `>= 0`.
pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, CoreError> {
    ensure_finite(v, what)?;
    if v >= 0.0 {
        Ok(v)
    } else {
        Err(CoreError::InvalidParameter { what })
    }
}

/// Number of samples `N = ceil(t_end / dt) + 1` on a fixed grid starting at t=0.
///
/// A ratio within `1e-9` of an integer is treated as that integer, so
/// `t_end = 20.0, dt = 0.01` gives 2001 samples rather than 2002.
///
/// Grids longer than [`MAX_SAMPLE_COUNT`] are rejected.
pub fn sample_count(t_end: Real, dt: Real) -> Result<usize, CoreError> {
    ensure_positive(dt, "dt must be positive")?;
    ensure_positive(t_end, "t_end must be positive")?;
    let ratio = t_end / dt;
    ensure_finite(ratio, "t_end / dt")?;
    let rounded = ratio.round();
    let steps = if (ratio - rounded).abs() <= STEP_RATIO_SLACK * rounded.max(1.0) {
        rounded
    } else {
        ratio.ceil()
    };
    if steps >= MAX_SAMPLE_COUNT as Real {
        return Err(CoreError::InvalidParameter {
            what: "t_end / dt exceeds the maximum sample count",
        });
    }
    Ok(steps as usize + 1)
}

/// Arithmetic mean. Empty input yields NaN.
pub fn mean(values: &[Real]) -> Real {
    if values.is_empty() {
        return Real::NAN;
    }
    values.iter().sum::<Real>() / values.len() as Real
}

/// Population standard deviation (divides by `N`).
pub fn std_dev(values: &[Real]) -> Real {
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<Real>() / values.len() as Real;
    var.sqrt()
}

/// Sum of squared element-wise differences.
pub fn sum_squared_diff(a: &[Real], b: &[Real]) -> Result<Real, CoreError> {
    if a.len() != b.len() {
        return Err(CoreError::LengthMismatch {
            what: "sum_squared_diff",
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_positive_rejects_zero_and_negative() {
        assert!(ensure_positive(1e-9, "x").is_ok());
        assert_eq!(
            ensure_positive(0.0, "x"),
            Err(CoreError::InvalidParameter { what: "x" })
        );
        assert!(ensure_positive(-1.0, "x").is_err());
        assert!(ensure_positive(Real::INFINITY, "x").is_err());
    }

    #[test]
    fn ensure_non_negative_allows_zero() {
        assert!(ensure_non_negative(0.0, "zeta").is_ok());
        assert!(ensure_non_negative(-0.1, "zeta").is_err());
    }

    #[test]
    fn sample_count_exact_grid() {
        assert_eq!(sample_count(20.0, 0.01).unwrap(), 2001);
        assert_eq!(sample_count(50.0, 0.01).unwrap(), 5001);
        assert_eq!(sample_count(1.0, 0.5).unwrap(), 3);
    }

    #[test]
    fn sample_count_rounds_partial_step_up() {
        assert_eq!(sample_count(1.0, 0.3).unwrap(), 5);
    }

    #[test]
    fn sample_count_rejects_bad_inputs() {
        assert!(sample_count(1.0, 0.0).is_err());
        assert!(sample_count(0.0, 0.1).is_err());
        assert!(sample_count(-1.0, 0.1).is_err());
    }

    #[test]
    fn sample_count_rejects_oversized_grids() {
        assert!(matches!(
            sample_count(1.0, 1e-300),
            Err(CoreError::InvalidParameter { .. })
        ));
        assert!(sample_count(1e6, 0.01).is_err());
        assert_eq!(
            sample_count((MAX_SAMPLE_COUNT - 1) as Real, 1.0).unwrap(),
            MAX_SAMPLE_COUNT
        );
    }

    #[test]
    fn mean_and_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), 5.0);
        assert_eq!(std_dev(&v), 2.0);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn sum_squared_diff_checks_lengths() {
        assert_eq!(sum_squared_diff(&[1.0, 2.0], &[1.0, 4.0]).unwrap(), 4.0);
        assert!(sum_squared_diff(&[1.0], &[1.0, 2.0]).is_err());
    }
}
