//! # Exogenous Features
//!
//! Builds the daily regressor tables that feed the exogenous price forecast:
//! per-region weather merged into averages, and news headlines scored for
//! sentiment and averaged per day.
//!
//! Fetching weather or news is left to the caller; this crate only works on
//! tables it is handed.

use price_forecast::ForecastError;
use thiserror::Error;

pub mod assembler;
pub mod news;
pub mod sentiment;
pub mod weather;

pub use assembler::{ExogenousFeatures, FeatureAssembler, FeatureWindow, NEWS_LOOKBACK_CAP_DAYS};
pub use news::{daily_sentiment, Headline};
pub use sentiment::{SentimentScorer, VaderScorer};
pub use weather::{merge_regions, RegionWeather, WeatherObservation};

/// Errors raised while building feature tables
#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Polars error: {0}")]
    PolarsError(String),

    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

impl From<polars::prelude::PolarsError> for FeatureError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        FeatureError::PolarsError(err.to_string())
    }
}

/// Result type for feature operations
pub type Result<T> = std::result::Result<T, FeatureError>;
