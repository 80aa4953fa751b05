//! Regional weather tables
//!
//! Each region contributes a `temp_<region>` and a `precip_<region>` column.
//! Merging regions joins them on date and adds `temp_avg` / `precip_avg`,
//! the row-wise means over whichever regions reported that day.

use crate::{FeatureError, Result};
use chrono::NaiveDate;
use forecast_math::stats::mean_present;
use polars::prelude::*;
use price_forecast::data::{column_dates, column_values, find_column, resolve_date_column};
use price_forecast::RegressorFrame;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Temperature column names in order of preference
pub const TEMPERATURE_CANDIDATES: [&str; 3] = ["temp", "temperature", "temperature_2m_mean"];

/// Precipitation column names in order of preference
pub const PRECIPITATION_CANDIDATES: [&str; 3] = ["precip", "precipitation", "precipitation_sum"];

pub const TEMPERATURE_AVG: &str = "temp_avg";
pub const PRECIPITATION_AVG: &str = "precip_avg";

/// One day of weather for one region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherObservation {
    pub date: NaiveDate,
    pub temperature: Option<f64>,
    pub precipitation: Option<f64>,
}

/// Daily weather series for a named region
#[derive(Debug, Clone, PartialEq)]
pub struct RegionWeather {
    region: String,
    observations: Vec<WeatherObservation>,
}

impl RegionWeather {
    pub fn new(region: impl Into<String>, observations: Vec<WeatherObservation>) -> Self {
        Self {
            region: region.into(),
            observations,
        }
    }

    /// Read a region's weather from a table.
    ///
    /// The date column follows the price-table heuristic; temperature and
    /// precipitation are matched against their candidate lists and become
    /// missing when absent. Rows without a parseable date are dropped.
    pub fn from_dataframe(region: impl Into<String>, df: &DataFrame) -> Result<Self> {
        let region = region.into();
        let names = df.get_column_names();
        let date_column = resolve_date_column(&names)
            .ok_or_else(|| FeatureError::DataError(format!("Weather table for {} has no columns", region)))?;

        let dates = column_dates(df, &date_column)?;
        let temperature = optional_values(df, &names, &TEMPERATURE_CANDIDATES)?;
        let precipitation = optional_values(df, &names, &PRECIPITATION_CANDIDATES)?;

        let observations = dates
            .into_iter()
            .enumerate()
            .filter_map(|(row, date)| {
                Some(WeatherObservation {
                    date: date?,
                    temperature: temperature[row],
                    precipitation: precipitation[row],
                })
            })
            .collect();

        Ok(Self { region, observations })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn observations(&self) -> &[WeatherObservation] {
        &self.observations
    }

    pub fn temperature_column(&self) -> String {
        format!("temp_{}", self.region)
    }

    pub fn precipitation_column(&self) -> String {
        format!("precip_{}", self.region)
    }

    /// Observations whose date falls inside `window`
    pub fn within(&self, window: &RangeInclusive<NaiveDate>) -> Self {
        Self {
            region: self.region.clone(),
            observations: self
                .observations
                .iter()
                .filter(|o| window.contains(&o.date))
                .copied()
                .collect(),
        }
    }

    /// Region columns keyed by date; a repeated date keeps its last observation
    pub fn to_frame(&self) -> Result<RegressorFrame> {
        let by_date: BTreeMap<NaiveDate, &WeatherObservation> =
            self.observations.iter().map(|o| (o.date, o)).collect();

        let dates = by_date.keys().copied().collect();
        let temperature = by_date.values().map(|o| o.temperature).collect();
        let precipitation = by_date.values().map(|o| o.precipitation).collect();

        Ok(RegressorFrame::new(
            dates,
            vec![
                (self.temperature_column(), temperature),
                (self.precipitation_column(), precipitation),
            ],
        )?)
    }
}

fn optional_values(df: &DataFrame, names: &[&str], candidates: &[&str]) -> Result<Vec<Option<f64>>> {
    match find_column(names, candidates) {
        Some(name) => Ok(column_values(df, &name)?),
        None => Ok(vec![None; df.height()]),
    }
}

/// Outer-join every region on date and append `temp_avg` and `precip_avg`.
///
/// With no regions the result has no rows but still carries both average
/// columns. A region whose columns would shadow an average column is rejected.
pub fn merge_regions(regions: &[RegionWeather]) -> Result<RegressorFrame> {
    let mut merged = RegressorFrame::default();
    let mut temperature_columns = Vec::with_capacity(regions.len());
    let mut precipitation_columns = Vec::with_capacity(regions.len());

    for region in regions {
        let shadowed = [region.temperature_column(), region.precipitation_column()]
            .into_iter()
            .find(|name| name == TEMPERATURE_AVG || name == PRECIPITATION_AVG);
        if let Some(name) = shadowed {
            return Err(FeatureError::InvalidParameter(format!(
                "Region '{}' produces column '{}', which is reserved for the regional average",
                region.region(),
                name
            )));
        }
        merged = merged.outer_join(&region.to_frame()?)?;
        temperature_columns.push(region.temperature_column());
        precipitation_columns.push(region.precipitation_column());
    }

    let temperature_avg = row_means(&merged, &temperature_columns);
    let precipitation_avg = row_means(&merged, &precipitation_columns);

    Ok(merged
        .with_column(TEMPERATURE_AVG, temperature_avg)?
        .with_column(PRECIPITATION_AVG, precipitation_avg)?)
}

fn row_means(frame: &RegressorFrame, names: &[String]) -> Vec<Option<f64>> {
    let columns: Vec<&[Option<f64>]> = names.iter().filter_map(|n| frame.column(n)).collect();
    (0..frame.height())
        .map(|row| {
            let cells: Vec<Option<f64>> = columns.iter().map(|c| c[row]).collect();
            mean_present(&cells)
        })
        .collect()
}
