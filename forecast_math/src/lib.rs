//! # Forecast Math
//!
//! Numeric building blocks for the commodity forecasting engine.
//! This crate has no notion of dates or tables; it works on plain `f64`
//! slices so the model code in `price_forecast` stays readable.

use thiserror::Error;

pub mod optimize;
pub mod polynomial;
pub mod regression;
pub mod stats;

pub use optimize::{nelder_mead, NelderMeadConfig, NelderMeadResult};

/// Errors that can occur in numeric routines
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
