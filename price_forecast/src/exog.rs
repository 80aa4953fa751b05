//! Forecasting with exogenous regressors
//!
//! The aligner puts a price table and a regressor table on one daily index.
//! Gaps inside the regressors are carried forward, but values before the
//! regressor table starts stay missing. The forecaster then fits a regression
//! with seasonal ARIMA errors and projects it over future regressor values.

use crate::data::PriceSeries;
use crate::error::Result;
use crate::forecast::ALPHA_95;
use crate::frame::RegressorFrame;
use crate::models::{FittedModel, ForecastModel, SarimaModel};
use crate::table::{ExogForecastRow, ExogenousTable, ForecastStatus, ForecastTable};
use polars::prelude::DataFrame;
use tracing::{debug, info, warn};

/// Price series and regressors sharing one daily date index
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedInputs {
    pub prices: PriceSeries,
    pub regressors: RegressorFrame,
}

impl AlignedInputs {
    /// True when either side has nothing to fit on
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty() || self.regressors.is_empty()
    }
}

/// Align an already normalized price series with a regressor frame
pub fn align(prices: PriceSeries, regressors: &RegressorFrame) -> AlignedInputs {
    let mut daily = regressors.to_daily();
    daily.forward_fill();

    let mut aligned = daily.reindex(prices.dates());
    aligned.forward_fill();

    AlignedInputs {
        prices,
        regressors: aligned,
    }
}

/// Normalize a raw price table and a raw regressor table onto the price dates
pub fn align_exogenous(price_df: &DataFrame, exog_df: &DataFrame) -> Result<AlignedInputs> {
    let prices = PriceSeries::from_dataframe(price_df)?;
    let regressors = RegressorFrame::from_dataframe(exog_df)?;
    Ok(align(prices, &regressors))
}

/// Single-horizon forecast with its outcome
#[derive(Debug, Clone, PartialEq)]
pub struct ExogenousForecast {
    pub status: ForecastStatus,
    pub table: ExogenousTable,
}

impl ExogenousForecast {
    fn no_data() -> Self {
        Self {
            status: ForecastStatus::NoExogenousData,
            table: ForecastTable::empty(),
        }
    }
}

/// Regression with seasonal ARIMA errors, 95% band only
#[derive(Debug, Clone)]
pub struct ExogenousForecaster<M = SarimaModel> {
    model: M,
}

impl ExogenousForecaster<SarimaModel> {
    pub fn new() -> Self {
        Self::with_model(SarimaModel::default())
    }
}

impl Default for ExogenousForecaster<SarimaModel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ForecastModel> ExogenousForecaster<M> {
    pub fn with_model(model: M) -> Self {
        Self { model }
    }

    /// Forecast `horizon` days past the last aligned price date.
    ///
    /// `past` is aligned onto the price dates; `future` supplies regressor
    /// values for the forecast window and is truncated or extended (repeating
    /// its last row) to exactly `horizon` rows.
    pub fn forecast(
        &self,
        prices: PriceSeries,
        past: &RegressorFrame,
        future: &RegressorFrame,
        horizon: usize,
    ) -> Result<ExogenousForecast> {
        let aligned = align(prices, past);
        if aligned.is_empty() {
            warn!("aligned prices or regressors are empty, no exogenous forecast");
            return Ok(ExogenousForecast::no_data());
        }

        // Leading rows before every regressor has started cannot be fitted on
        let Some(start) = aligned.regressors.first_complete_row() else {
            warn!("regressors never overlap the price history, no exogenous forecast");
            return Ok(ExogenousForecast::no_data());
        };
        if start > 0 {
            debug!(dropped_rows = start, "dropping leading rows with missing regressors");
        }
        let prices = aligned.prices.tail_from(start);
        let regressors = aligned.regressors.tail_from(start);

        let Some(future) = future_regressors(future, &regressors, horizon)? else {
            warn!("future regressor table is empty, no exogenous forecast");
            return Ok(ExogenousForecast::no_data());
        };

        let exog = regressors.to_dense_columns()?;
        let future_exog = future.to_dense_columns()?;

        let fitted = self.model.fit(prices.values(), Some(&exog))?;
        let path = fitted.forecast(horizon, ALPHA_95, Some(&future_exog))?;

        let Some(last_date) = prices.last_date() else {
            return Ok(ExogenousForecast::no_data());
        };
        let rows = last_date
            .iter_days()
            .skip(1)
            .zip(0..path.len())
            .map(|(date, h)| ExogForecastRow {
                date,
                mean: path.mean()[h],
                lower95: path.lower()[h],
                upper95: path.upper()[h],
            })
            .collect();

        info!(
            model = fitted.name(),
            observations = prices.len(),
            regressors = ?regressors.column_names(),
            horizon,
            "exogenous forecast complete"
        );
        Ok(ExogenousForecast {
            status: ForecastStatus::Fitted,
            table: ForecastTable::new(rows),
        })
    }

    /// Same as [`Self::forecast`] starting from raw tables
    pub fn forecast_dataframes(
        &self,
        price_df: &DataFrame,
        past_df: &DataFrame,
        future_df: &DataFrame,
        horizon: usize,
    ) -> Result<ExogenousForecast> {
        let prices = PriceSeries::from_dataframe(price_df)?;
        let past = RegressorFrame::from_dataframe(past_df)?;
        let future = RegressorFrame::from_dataframe(future_df)?;
        self.forecast(prices, &past, &future, horizon)
    }
}

/// Future regressors with the past column set and exactly `horizon` rows.
///
/// Cells still missing after the forward fill fall back to the last past
/// value of that regressor. `None` when there are no future rows at all.
fn future_regressors(
    future: &RegressorFrame,
    past: &RegressorFrame,
    horizon: usize,
) -> Result<Option<RegressorFrame>> {
    if future.height() == 0 {
        return Ok(None);
    }

    let names = past.column_names();
    let mut daily = future.to_daily().select(&names);
    daily.forward_fill();
    let daily = daily.resized(horizon);

    let mut filled = RegressorFrame::from_dates(daily.dates().to_vec());
    for (name, values) in daily.columns() {
        let fallback = past.column(name).and_then(|v| v.iter().rev().find_map(|x| *x));
        if values.iter().any(Option::is_none) {
            warn!(regressor = %name, "future regressor missing, using last past value");
        }
        let values = values.iter().map(|v| v.or(fallback)).collect();
        filled = filled.with_column(name, values)?;
    }
    Ok(Some(filled))
}

/// Forecast `horizon` days of prices from raw price, past and future tables
pub fn forecast_with_exog(
    price_df: &DataFrame,
    past_df: &DataFrame,
    future_df: &DataFrame,
    horizon: usize,
) -> Result<ExogenousForecast> {
    ExogenousForecaster::new().forecast_dataframes(price_df, past_df, future_df, horizon)
}
