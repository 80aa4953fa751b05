//! Distribution helpers for interval construction

use crate::{MathError, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// Two-sided standard normal critical value for significance `alpha`.
///
/// `alpha = 0.05` gives roughly 1.96, the half-width multiplier of a 95% band.
pub fn two_sided_critical_value(alpha: f64) -> Result<f64> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Significance level must be in (0, 1), got {}",
            alpha
        )));
    }

    let normal = Normal::new(0.0, 1.0).map_err(|e| MathError::CalculationError(e.to_string()))?;
    Ok(normal.inverse_cdf(1.0 - alpha / 2.0))
}

/// Mean of the present values, `None` when nothing is present
pub fn mean_present(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_critical_values() {
        assert_abs_diff_eq!(two_sided_critical_value(0.05).unwrap(), 1.959964, epsilon = 1e-5);
        assert_abs_diff_eq!(two_sided_critical_value(0.20).unwrap(), 1.281552, epsilon = 1e-5);
    }

    #[test]
    fn test_invalid_alpha() {
        assert!(two_sided_critical_value(0.0).is_err());
        assert!(two_sided_critical_value(1.0).is_err());
        assert!(two_sided_critical_value(f64::NAN).is_err());
    }

    #[test]
    fn test_mean_present() {
        assert_eq!(mean_present(&[Some(1.0), None, Some(3.0)]), Some(2.0));
        assert_eq!(mean_present(&[None, None]), None);
        assert_eq!(mean_present(&[]), None);
    }
}
