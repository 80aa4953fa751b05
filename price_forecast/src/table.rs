//! Forecast output tables
//!
//! The column names and their order are a fixed contract shared with CSV
//! export and the dashboard, so they live on the row types themselves.

use crate::data::date_series;
use crate::error::Result;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// How a forecast request was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastStatus {
    /// A model was fitted and forecast
    Fitted,
    /// No usable price rows; tables are empty
    EmptyInput,
    /// Too little history to fit; tables hold a flat naive forecast
    InsufficientHistory,
    /// Aligned prices or regressors were empty; the table is empty
    NoExogenousData,
}

impl fmt::Display for ForecastStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ForecastStatus::Fitted => "fitted",
            ForecastStatus::EmptyInput => "empty input",
            ForecastStatus::InsufficientHistory => "insufficient history",
            ForecastStatus::NoExogenousData => "no exogenous data",
        };
        f.write_str(label)
    }
}

/// A row of a forecast table
pub trait TableRow: Clone + Serialize {
    /// Column names in output order, `date` first
    const COLUMNS: &'static [&'static str];

    fn date(&self) -> NaiveDate;

    fn mean(&self) -> f64;

    /// Numeric cells in the order of `COLUMNS[1..]`
    fn numeric_fields(&self) -> Vec<f64>;

    /// Whether every lower bound sits below the mean and every upper bound above it
    fn is_ordered(&self) -> bool;
}

/// Univariate forecast row with 80% and 95% bands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub date: NaiveDate,
    pub mean: f64,
    pub lower80: f64,
    pub upper80: f64,
    pub lower95: f64,
    pub upper95: f64,
}

impl ForecastRow {
    /// Row where the mean and every bound equal `value`
    pub fn flat(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            mean: value,
            lower80: value,
            upper80: value,
            lower95: value,
            upper95: value,
        }
    }
}

impl TableRow for ForecastRow {
    const COLUMNS: &'static [&'static str] =
        &["date", "mean", "lower80", "upper80", "lower95", "upper95"];

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn mean(&self) -> f64 {
        self.mean
    }

    fn numeric_fields(&self) -> Vec<f64> {
        vec![self.mean, self.lower80, self.upper80, self.lower95, self.upper95]
    }

    fn is_ordered(&self) -> bool {
        self.lower95 <= self.lower80
            && self.lower80 <= self.mean
            && self.mean <= self.upper80
            && self.upper80 <= self.upper95
    }
}

/// Exogenous forecast row, 95% band only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExogForecastRow {
    pub date: NaiveDate,
    pub mean: f64,
    pub lower95: f64,
    pub upper95: f64,
}

impl TableRow for ExogForecastRow {
    const COLUMNS: &'static [&'static str] = &["date", "mean", "lower95", "upper95"];

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn mean(&self) -> f64 {
        self.mean
    }

    fn numeric_fields(&self) -> Vec<f64> {
        vec![self.mean, self.lower95, self.upper95]
    }

    fn is_ordered(&self) -> bool {
        self.lower95 <= self.mean && self.mean <= self.upper95
    }
}

/// Ordered forecast rows, one per calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastTable<R> {
    rows: Vec<R>,
}

/// Table produced by the univariate forecaster
pub type UnivariateTable = ForecastTable<ForecastRow>;

/// Table produced by the exogenous forecaster
pub type ExogenousTable = ForecastTable<ExogForecastRow>;

impl<R: TableRow> ForecastTable<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self { rows }
    }

    /// Zero-row table with the full schema
    pub fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &'static [&'static str] {
        R::COLUMNS
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Self {
        Self {
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    pub fn first(&self) -> Option<&R> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&R> {
        self.rows.last()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(TableRow::date).collect()
    }

    pub fn means(&self) -> Vec<f64> {
        self.rows.iter().map(TableRow::mean).collect()
    }

    /// Convert to a DataFrame with the contract columns
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let dates = self.dates();
        let mut series = vec![date_series(R::COLUMNS[0], &dates)?];

        let fields: Vec<Vec<f64>> = self.rows.iter().map(TableRow::numeric_fields).collect();
        for (i, name) in R::COLUMNS.iter().skip(1).enumerate() {
            let values: Vec<f64> = fields.iter().map(|row| row[i]).collect();
            series.push(Series::new(name, values));
        }

        Ok(DataFrame::new(series)?)
    }

    /// Write CSV to any writer; the header is written even with zero rows
    pub fn write_csv_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(R::COLUMNS)?;
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write CSV to a file, replacing it if present
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_csv_to(file)
    }

    /// Rows as a JSON array of objects
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.rows)?)
    }
}

impl<R: TableRow> Default for ForecastTable<R> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> UnivariateTable {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ForecastTable::new(vec![ForecastRow {
            date: d,
            mean: 10.0,
            lower80: 9.0,
            upper80: 11.0,
            lower95: 8.0,
            upper95: 12.0,
        }])
    }

    #[test]
    fn test_csv_contract() {
        let mut buffer = Vec::new();
        sample().write_csv_to(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "date,mean,lower80,upper80,lower95,upper95\n2024-01-01,10.0,9.0,11.0,8.0,12.0\n"
        );
    }

    #[test]
    fn test_empty_csv_keeps_header() {
        let mut buffer = Vec::new();
        ExogenousTable::empty().write_csv_to(&mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "date,mean,lower95,upper95\n");
    }

    #[test]
    fn test_to_dataframe_schema() {
        let df = UnivariateTable::empty().to_dataframe().unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(
            df.get_column_names(),
            vec!["date", "mean", "lower80", "upper80", "lower95", "upper95"]
        );

        let df = sample().to_dataframe().unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.column("upper95").unwrap().f64().unwrap().get(0), Some(12.0));
    }

    #[test]
    fn test_row_ordering() {
        assert!(sample().rows()[0].is_ordered());
        let mut bad = sample().rows()[0].clone();
        bad.lower80 = 13.0;
        assert!(!bad.is_ordered());
    }

    #[test]
    fn test_head_and_json() {
        let table = sample();
        assert!(table.head(0).is_empty());
        let json = table.to_json().unwrap();
        assert!(json.contains("\"lower80\":9.0"));
        assert!(json.contains("\"date\":\"2024-01-01\""));
    }
}
