//! Headline figures for a multi-horizon forecast

use crate::forecast::MultiHorizonForecast;
use crate::table::ForecastStatus;
use serde::Serialize;

/// KPI block shown next to the forecast charts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub status: ForecastStatus,
    pub last_actual: Option<f64>,
    /// First mean of the shortest horizon
    pub next_day: Option<f64>,
    /// Last mean of the longest horizon
    pub horizon_end: Option<f64>,
    pub longest_horizon: Option<usize>,
    /// `next_day - last_actual`
    pub next_day_change: Option<f64>,
    /// Percentage move from the last actual to the end of the longest horizon
    pub horizon_change_pct: Option<f64>,
}

impl ForecastSummary {
    pub fn from_forecast(last_actual: Option<f64>, forecast: &MultiHorizonForecast) -> Self {
        let next_day = forecast.shortest().and_then(|t| t.first()).map(|r| r.mean);
        let horizon_end = forecast.longest().and_then(|t| t.last()).map(|r| r.mean);

        let next_day_change = last_actual.zip(next_day).map(|(a, n)| n - a);
        let horizon_change_pct = last_actual
            .zip(horizon_end)
            .filter(|(a, _)| *a != 0.0)
            .map(|(a, e)| (e - a) / a.abs() * 100.0);

        Self {
            status: forecast.status(),
            last_actual,
            next_day,
            horizon_end,
            longest_horizon: forecast.horizons().last().copied(),
            next_day_change,
            horizon_change_pct,
        }
    }
}
