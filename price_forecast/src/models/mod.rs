//! Forecasting models
//!
//! A [`ForecastModel`] is an unfitted model; fitting it on a series
//! (and optional regressors) yields a [`FittedModel`] that can be asked for
//! forecasts at any significance level.

use crate::error::{ForecastError, Result};
use std::fmt::Debug;

pub mod sarima;

pub use sarima::{FittedSarima, SarimaModel, SarimaOrder, SarimaParams};

/// Point forecast with a symmetric prediction band
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPath {
    mean: Vec<f64>,
    std_errors: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    alpha: f64,
}

impl ForecastPath {
    /// Build a path from means and standard errors using critical value `z`
    pub fn from_std_errors(mean: Vec<f64>, std_errors: Vec<f64>, z: f64, alpha: f64) -> Result<Self> {
        if mean.len() != std_errors.len() {
            return Err(ForecastError::ValidationError(format!(
                "Mean length ({}) doesn't match standard error length ({})",
                mean.len(),
                std_errors.len()
            )));
        }

        let lower = mean.iter().zip(&std_errors).map(|(m, s)| m - z * s).collect();
        let upper = mean.iter().zip(&std_errors).map(|(m, s)| m + z * s).collect();

        Ok(Self {
            mean,
            std_errors,
            lower,
            upper,
            alpha,
        })
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn std_errors(&self) -> &[f64] {
        &self.std_errors
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Significance level of the band (0.05 for a 95% band)
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

/// A fitted model that can forecast ahead of its sample
pub trait FittedModel: Debug {
    /// Forecast `steps` periods past the end of the sample.
    ///
    /// `future_exog` holds one column per regressor used in the fit, each with
    /// at least `steps` values.
    fn forecast(&self, steps: usize, alpha: f64, future_exog: Option<&[Vec<f64>]>) -> Result<ForecastPath>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Unfitted model that can be fitted to a series
pub trait ForecastModel: Debug + Clone {
    /// The type of fitted model produced
    type Fitted: FittedModel;

    /// Fit on `endog`, with optional regressor columns of the same length
    fn fit(&self, endog: &[f64], exog: Option<&[Vec<f64>]>) -> Result<Self::Fitted>;

    /// Get the name of the model
    fn name(&self) -> &str;
}
