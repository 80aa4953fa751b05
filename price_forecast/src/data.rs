//! Price table ingestion and daily normalization
//!
//! Raw price tables arrive with unknown column names. The date and price
//! columns are picked by [`resolve_date_column`] and [`resolve_price_column`],
//! the values are coerced leniently, and the result is a gap-free daily
//! [`PriceSeries`].

use crate::error::Result;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Price column names in order of preference (compared lowercase)
pub const PRICE_CANDIDATES: [&str; 8] = [
    "price",
    "close",
    "adj close",
    "adj_close",
    "settle",
    "value",
    "last",
    "rate",
];

/// Date column names in order of preference (compared lowercase)
pub const DATE_CANDIDATES: [&str; 3] = ["date", "timestamp", "time"];

/// Days between 0001-01-01 and 1970-01-01, used for polars `Date` columns
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Return the first candidate found among `columns`.
///
/// Matching is case-insensitive and ignores surrounding whitespace. Candidate
/// order wins over column order, and the original column name is returned.
pub fn find_column(columns: &[&str], candidates: &[&str]) -> Option<String> {
    let lowered: Vec<String> = columns.iter().map(|c| c.trim().to_lowercase()).collect();
    candidates.iter().find_map(|candidate| {
        lowered
            .iter()
            .position(|c| c == candidate)
            .map(|i| columns[i].to_string())
    })
}

/// Price column: first of [`PRICE_CANDIDATES`], otherwise the rightmost column
pub fn resolve_price_column(columns: &[&str]) -> Option<String> {
    find_column(columns, &PRICE_CANDIDATES).or_else(|| columns.last().map(|c| c.to_string()))
}

/// Date column: first of [`DATE_CANDIDATES`], otherwise the leftmost column
pub fn resolve_date_column(columns: &[&str]) -> Option<String> {
    find_column(columns, &DATE_CANDIDATES).or_else(|| columns.first().map(|c| c.to_string()))
}

/// Parse a date-like cell into a calendar date.
///
/// Accepts plain dates in common layouts, date-times (the date part is kept,
/// RFC 3339 offsets are honoured), compact `YYYYMMDD` values and monthly
/// `YYYY-MM` periods, which map to the first day of the month.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(text, format) {
            return Some(timestamp.date());
        }
    }

    if let Ok(month) = NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d") {
        return Some(month);
    }

    // e.g. "2024-03-01 00:00:00 UTC"
    text.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

pub(crate) fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Build a polars `Date` series from calendar dates
pub fn date_series(name: &str, dates: &[NaiveDate]) -> Result<Series> {
    let days: Vec<i32> = dates.iter().map(|d| epoch_days(*d)).collect();
    Ok(Series::new(name, days).cast(&DataType::Date)?)
}

/// Read a column as calendar dates; unparseable cells become `None`
pub fn column_dates(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>> {
    let text = df.column(name)?.cast(&DataType::Utf8)?;
    let dates = text
        .utf8()?
        .into_iter()
        .map(|cell| cell.and_then(parse_date))
        .collect();
    Ok(dates)
}

/// Read a column as finite reals; unparseable cells become `None`
pub fn column_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name)?;

    if column.dtype().is_numeric() {
        let numeric = column.cast(&DataType::Float64)?;
        let values = numeric
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        return Ok(values);
    }

    let text = column.cast(&DataType::Utf8)?;
    let values = text
        .utf8()?
        .into_iter()
        .map(|cell| {
            cell.and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|x| x.is_finite())
        })
        .collect();
    Ok(values)
}

/// Loader for tabular inputs kept on disk
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file with a header row into a DataFrame
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;
        Ok(df)
    }

    /// Load a CSV price table and normalize it into a daily series
    pub fn prices_from_csv<P: AsRef<Path>>(path: P) -> Result<PriceSeries> {
        let df = Self::from_csv(path)?;
        PriceSeries::from_dataframe(&df)
    }
}

/// Gap-free daily price series
///
/// Dates are strictly increasing and exactly one day apart. An empty series
/// is the explicit "no usable rows" outcome of normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl PriceSeries {
    /// Series with no observations
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a daily series from unordered observations.
    ///
    /// Observations are sorted by date; for a repeated date the one that came
    /// last in the input wins. Missing days carry the previous value forward.
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut sorted: Vec<(NaiveDate, f64)> = observations.into_iter().collect();
        sorted.sort_by_key(|(date, _)| *date);

        let mut dates: Vec<NaiveDate> = Vec::with_capacity(sorted.len());
        let mut values: Vec<f64> = Vec::with_capacity(sorted.len());

        for (date, value) in sorted {
            match dates.last().copied() {
                Some(last) if last == date => {
                    if let Some(slot) = values.last_mut() {
                        *slot = value;
                    }
                }
                Some(last) => {
                    let carried = values.last().copied().unwrap_or(value);
                    let mut day = last;
                    while let Some(next) = day.succ_opt() {
                        if next >= date {
                            break;
                        }
                        dates.push(next);
                        values.push(carried);
                        day = next;
                    }
                    dates.push(date);
                    values.push(value);
                }
                None => {
                    dates.push(date);
                    values.push(value);
                }
            }
        }

        Self { dates, values }
    }

    /// Normalize a raw price table.
    ///
    /// Rows whose date or price cannot be parsed are dropped. A table with no
    /// usable rows yields an empty series rather than an error.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        if df.height() == 0 || df.width() == 0 {
            return Ok(Self::empty());
        }

        let columns = df.get_column_names();
        let (Some(date_column), Some(price_column)) =
            (resolve_date_column(&columns), resolve_price_column(&columns))
        else {
            return Ok(Self::empty());
        };

        let dates = column_dates(df, &date_column)?;
        let prices = column_values(df, &price_column)?;

        let observations: Vec<(NaiveDate, f64)> = dates
            .into_iter()
            .zip(prices)
            .filter_map(|(date, price)| Some((date?, price?)))
            .collect();
        let dropped = df.height() - observations.len();

        let series = Self::from_observations(observations);
        debug!(
            date_column = %date_column,
            price_column = %price_column,
            dropped_rows = dropped,
            days = series.len(),
            "normalized price table"
        );
        Ok(series)
    }

    /// Calendar dates, one per day
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Prices aligned with [`Self::dates`]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of daily observations
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series has no observations
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Suffix of the series starting at `start`
    pub fn tail_from(&self, start: usize) -> Self {
        let start = start.min(self.len());
        Self {
            dates: self.dates[start..].to_vec(),
            values: self.values[start..].to_vec(),
        }
    }

    /// Convert back to a two-column (`date`, `price`) DataFrame
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let date = date_series("date", &self.dates)?;
        let price = Series::new("price", self.values.clone());
        Ok(DataFrame::new(vec![date, price])?)
    }
}

/// Normalize a raw price table into a daily series
pub fn normalize_prices(df: &DataFrame) -> Result<PriceSeries> {
    PriceSeries::from_dataframe(df)
}
