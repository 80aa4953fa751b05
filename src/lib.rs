//! # Commodity Forecast
//!
//! Workspace facade for the commodity forecasting engine.
//!
//! - [`price_forecast`]: price normalization, seasonal ARIMA forecasts and
//!   forecast tables
//! - [`exog_features`]: weather and news regressors for the exogenous path
//! - [`config`]: TOML configuration for the `commodity-forecast` binary
//!
//! ## Example
//!
//! ```no_run
//! use commodity_forecast::config::ForecastConfig;
//! use commodity_forecast::price_forecast::{DataLoader, UnivariateForecaster};
//!
//! let config = ForecastConfig::load(None)?;
//! let prices = DataLoader::prices_from_csv("brent.csv")?;
//! let forecast = UnivariateForecaster::new()
//!     .with_horizons(&config.forecast.horizons)?
//!     .forecast(&prices)?;
//! println!("{}", forecast.status());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;

pub use exog_features;
pub use price_forecast;

pub use config::{ConfigError, ForecastConfig};
