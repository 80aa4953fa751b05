//! Multi-horizon univariate forecasting
//!
//! One model fit and one forecast run of the longest horizon serve every
//! requested horizon: each horizon's table is a prefix of the shared run, so
//! shorter forecasts are always nested in longer ones.

use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use crate::models::{FittedModel, ForecastModel, ForecastPath, SarimaModel};
use crate::table::{ForecastRow, ForecastStatus, ForecastTable, UnivariateTable};
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Default forecast horizons in days
pub const HORIZONS: [usize; 4] = [7, 30, 180, 365];

/// Fewest observations needed before a model is fitted
pub const MIN_HISTORY: usize = 20;

/// Significance level of the 95% band
pub const ALPHA_95: f64 = 0.05;

/// Significance level of the 80% band
pub const ALPHA_80: f64 = 0.20;

/// Forecast tables keyed by horizon, with the outcome that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct MultiHorizonForecast {
    status: ForecastStatus,
    tables: BTreeMap<usize, UnivariateTable>,
}

impl MultiHorizonForecast {
    pub fn new(status: ForecastStatus, tables: BTreeMap<usize, UnivariateTable>) -> Self {
        Self { status, tables }
    }

    pub fn status(&self) -> ForecastStatus {
        self.status
    }

    /// Table for one horizon, if it was requested
    pub fn table(&self, horizon: usize) -> Option<&UnivariateTable> {
        self.tables.get(&horizon)
    }

    pub fn tables(&self) -> &BTreeMap<usize, UnivariateTable> {
        &self.tables
    }

    /// Requested horizons in ascending order
    pub fn horizons(&self) -> Vec<usize> {
        self.tables.keys().copied().collect()
    }

    pub fn shortest(&self) -> Option<&UnivariateTable> {
        self.tables.values().next()
    }

    pub fn longest(&self) -> Option<&UnivariateTable> {
        self.tables.values().next_back()
    }

    pub fn into_tables(self) -> BTreeMap<usize, UnivariateTable> {
        self.tables
    }
}

/// Fits one model per request and slices its forecast into horizon tables
#[derive(Debug, Clone)]
pub struct UnivariateForecaster<M = SarimaModel> {
    model: M,
    horizons: Vec<usize>,
}

impl UnivariateForecaster<SarimaModel> {
    /// Weekly seasonal ARIMA over the default horizons
    pub fn new() -> Self {
        Self::with_model(SarimaModel::default())
    }
}

impl Default for UnivariateForecaster<SarimaModel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ForecastModel> UnivariateForecaster<M> {
    pub fn with_model(model: M) -> Self {
        Self {
            model,
            horizons: HORIZONS.to_vec(),
        }
    }

    /// Replace the horizon set; duplicates are ignored
    pub fn with_horizons(mut self, horizons: &[usize]) -> Result<Self> {
        if horizons.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "At least one horizon is required".to_string(),
            ));
        }
        if horizons.contains(&0) {
            return Err(ForecastError::InvalidParameter(
                "Horizons must be positive".to_string(),
            ));
        }
        let mut sorted = horizons.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        self.horizons = sorted;
        Ok(self)
    }

    pub fn horizons(&self) -> &[usize] {
        &self.horizons
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    fn max_horizon(&self) -> usize {
        self.horizons.iter().copied().max().unwrap_or(0)
    }

    fn empty_tables(&self) -> BTreeMap<usize, UnivariateTable> {
        self.horizons
            .iter()
            .map(|&h| (h, ForecastTable::empty()))
            .collect()
    }

    /// Forecast a normalized daily series over every configured horizon
    pub fn forecast(&self, series: &PriceSeries) -> Result<MultiHorizonForecast> {
        let (Some(last_date), Some(last_value)) = (series.last_date(), series.last_value()) else {
            warn!("no usable price rows, returning empty forecast tables");
            return Ok(MultiHorizonForecast::new(
                ForecastStatus::EmptyInput,
                self.empty_tables(),
            ));
        };

        if series.len() < MIN_HISTORY {
            warn!(
                observations = series.len(),
                required = MIN_HISTORY,
                "history too short to fit, using flat naive forecast"
            );
            let tables = self
                .horizons
                .iter()
                .map(|&h| (h, naive_table(last_date, last_value, h)))
                .collect();
            return Ok(MultiHorizonForecast::new(
                ForecastStatus::InsufficientHistory,
                tables,
            ));
        }

        let steps = self.max_horizon();
        let fitted = self.model.fit(series.values(), None)?;
        let wide = fitted.forecast(steps, ALPHA_95, None)?;
        let narrow = fitted.forecast(steps, ALPHA_80, None)?;
        let full = forecast_rows(last_date, &wide, &narrow)?;

        let tables = self
            .horizons
            .iter()
            .map(|&h| (h, full.head(h)))
            .collect();

        info!(
            model = fitted.name(),
            observations = series.len(),
            horizons = ?self.horizons,
            "univariate forecast complete"
        );
        Ok(MultiHorizonForecast::new(ForecastStatus::Fitted, tables))
    }

    /// Normalize a raw price table and forecast it
    pub fn forecast_dataframe(&self, df: &DataFrame) -> Result<MultiHorizonForecast> {
        let series = PriceSeries::from_dataframe(df)?;
        self.forecast(&series)
    }
}

/// `rows` flat rows starting on the last observed date
fn naive_table(last_date: NaiveDate, last_value: f64, rows: usize) -> UnivariateTable {
    let table = last_date
        .iter_days()
        .take(rows)
        .map(|date| ForecastRow::flat(date, last_value))
        .collect();
    ForecastTable::new(table)
}

fn forecast_rows(last_date: NaiveDate, wide: &ForecastPath, narrow: &ForecastPath) -> Result<UnivariateTable> {
    if wide.len() != narrow.len() {
        return Err(ForecastError::ValidationError(format!(
            "Band lengths differ: {} vs {}",
            wide.len(),
            narrow.len()
        )));
    }

    let rows = last_date
        .iter_days()
        .skip(1)
        .zip(0..wide.len())
        .map(|(date, h)| ForecastRow {
            date,
            mean: wide.mean()[h],
            lower80: narrow.lower()[h],
            upper80: narrow.upper()[h],
            lower95: wide.lower()[h],
            upper95: wide.upper()[h],
        })
        .collect();
    Ok(ForecastTable::new(rows))
}

/// Normalize `df` and forecast it over `horizons` with the weekly seasonal ARIMA
pub fn multi_forecast(df: &DataFrame, horizons: &[usize]) -> Result<MultiHorizonForecast> {
    UnivariateForecaster::new()
        .with_horizons(horizons)?
        .forecast_dataframe(df)
}
