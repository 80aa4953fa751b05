//! # Price Forecast
//!
//! Multi-horizon probabilistic forecasting of daily commodity prices.
//!
//! ## Features
//!
//! - Normalization of arbitrary price tables into gap-free daily series
//! - Seasonal ARIMA `(1,1,1)x(0,1,1)_7` fitted by conditional sum of squares
//! - Nested forecast tables for 7, 30, 180 and 365 days with 80% and 95% bands
//! - Regression with seasonal ARIMA errors on exogenous daily regressors
//! - CSV and JSON export of forecast tables
//!
//! Degenerate inputs are not errors: an empty table, a short history or
//! missing regressors are reported through [`ForecastStatus`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use price_forecast::data::DataLoader;
//! use price_forecast::forecast::UnivariateForecaster;
//!
//! let prices = DataLoader::prices_from_csv("wti.csv")?;
//! let forecast = UnivariateForecaster::new().forecast(&prices)?;
//!
//! if let Some(table) = forecast.table(30) {
//!     table.write_csv("wti_forecast_30d.csv")?;
//! }
//! # Ok::<(), price_forecast::ForecastError>(())
//! ```

pub mod data;
pub mod error;
pub mod exog;
pub mod forecast;
pub mod frame;
pub mod models;
pub mod summary;
pub mod table;
pub mod utils;

// Re-export commonly used types
pub use crate::data::{normalize_prices, DataLoader, PriceSeries};
pub use crate::error::{ForecastError, Result};
pub use crate::exog::{align_exogenous, forecast_with_exog, AlignedInputs, ExogenousForecast, ExogenousForecaster};
pub use crate::forecast::{multi_forecast, MultiHorizonForecast, UnivariateForecaster, HORIZONS, MIN_HISTORY};
pub use crate::frame::RegressorFrame;
pub use crate::models::{FittedModel, ForecastModel, ForecastPath, SarimaModel, SarimaOrder};
pub use crate::summary::ForecastSummary;
pub use crate::table::{
    ExogForecastRow, ExogenousTable, ForecastRow, ForecastStatus, ForecastTable, TableRow, UnivariateTable,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
