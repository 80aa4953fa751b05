//! Ordinary least squares

use crate::{MathError, Result};
use nalgebra::{DMatrix, DVector};

/// Relative cut-off below which singular values are treated as zero
const RANK_TOLERANCE: f64 = 1e-10;
const SVD_MAX_ITERATIONS: usize = 10_000;

/// Solve `min ||target - X b||` where `X` is given column by column.
///
/// Rank-deficient designs (constant or duplicated regressors) are solved in
/// the minimum-norm sense instead of failing.
pub fn least_squares(columns: &[Vec<f64>], target: &[f64]) -> Result<Vec<f64>> {
    if columns.is_empty() {
        return Ok(Vec::new());
    }
    if target.is_empty() {
        return Err(MathError::InsufficientData(
            "Least squares needs at least one observation".to_string(),
        ));
    }
    if let Some(bad) = columns.iter().position(|c| c.len() != target.len()) {
        return Err(MathError::InvalidInput(format!(
            "Regressor {} has {} rows, expected {}",
            bad,
            columns[bad].len(),
            target.len()
        )));
    }

    if target.iter().chain(columns.iter().flatten()).any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Least squares input contains non-finite values".to_string(),
        ));
    }

    let design = DMatrix::from_fn(target.len(), columns.len(), |r, c| columns[c][r]);
    let rhs = DVector::from_column_slice(target);

    let svd = design
        .try_svd(true, true, f64::EPSILON, SVD_MAX_ITERATIONS)
        .ok_or_else(|| MathError::CalculationError("SVD did not converge".to_string()))?;
    let largest = svd.singular_values.max();
    if largest == 0.0 {
        return Ok(vec![0.0; columns.len()]);
    }

    let solution = svd
        .solve(&rhs, largest * RANK_TOLERANCE)
        .map_err(|e| MathError::CalculationError(e.to_string()))?;

    if solution.iter().any(|b| !b.is_finite()) {
        return Err(MathError::CalculationError(
            "Least squares produced non-finite coefficients".to_string(),
        ));
    }

    Ok(solution.iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_fit() {
        let x1: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let x2: Vec<f64> = (0..10).map(|i| ((i * 7) % 5) as f64).collect();
        let y: Vec<f64> = x1.iter().zip(&x2).map(|(a, b)| 2.0 * a - 0.5 * b).collect();

        let beta = least_squares(&[x1, x2], &y).unwrap();
        assert_relative_eq!(beta[0], 2.0, epsilon = 1e-9);
        assert_relative_eq!(beta[1], -0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_column() {
        let x1 = vec![1.0, 2.0, 3.0, 4.0];
        let zeros = vec![0.0; 4];
        let y = vec![3.0, 6.0, 9.0, 12.0];

        let beta = least_squares(&[x1, zeros], &y).unwrap();
        assert_relative_eq!(beta[0], 3.0, epsilon = 1e-9);
        assert_relative_eq!(beta[1], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_all_zero_design() {
        let beta = least_squares(&[vec![0.0; 3]], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(beta, vec![0.0]);
    }

    #[test]
    fn test_no_columns() {
        assert!(least_squares(&[], &[1.0, 2.0]).unwrap().is_empty());
    }

    #[test]
    fn test_length_mismatch() {
        assert!(least_squares(&[vec![1.0, 2.0]], &[1.0, 2.0, 3.0]).is_err());
    }
}
