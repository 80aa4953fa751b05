//! Daily regressor tables
//!
//! [`RegressorFrame`] is the in-memory form of an exogenous regressor table:
//! one calendar date per row and an open set of named numeric columns whose
//! cells may be missing.

use crate::data::{column_dates, column_values, date_series, resolve_date_column};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Named regressor column
pub type Column = (String, Vec<Option<f64>>);

/// Date-indexed table of optional regressor values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegressorFrame {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl RegressorFrame {
    /// Create a frame, checking that every column matches the date index
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<Column>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for (name, values) in &columns {
            if values.len() != dates.len() {
                return Err(ForecastError::DataError(format!(
                    "Column '{}' has {} values for {} dates",
                    name,
                    values.len(),
                    dates.len()
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(ForecastError::DataError(format!(
                    "Duplicate regressor column '{}'",
                    name
                )));
            }
        }
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ForecastError::DataError(
                "Regressor dates must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { dates, columns })
    }

    /// Frame with the given dates and no columns
    pub fn from_dates(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            columns: Vec::new(),
        }
    }

    /// Read a regressor table.
    ///
    /// The date column is resolved with the same heuristic as price tables.
    /// Only numeric columns are kept. Rows with an unparseable date are
    /// dropped, rows are sorted, and for a repeated date the last row wins.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        if df.width() == 0 {
            return Ok(Self::default());
        }
        let names = df.get_column_names();
        let Some(date_column) = resolve_date_column(&names) else {
            return Ok(Self::default());
        };

        let raw_dates = column_dates(df, &date_column)?;

        let mut raw_columns = Vec::new();
        for series in df.get_columns() {
            if series.name() == date_column || !series.dtype().is_numeric() {
                continue;
            }
            raw_columns.push((series.name().to_string(), column_values(df, series.name())?));
        }

        // date -> source row, later rows overwrite earlier ones
        let mut by_date: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for (row, date) in raw_dates.iter().enumerate() {
            if let Some(date) = date {
                by_date.insert(*date, row);
            }
        }

        let dates: Vec<NaiveDate> = by_date.keys().copied().collect();
        let columns = raw_columns
            .into_iter()
            .map(|(name, values)| {
                let picked = by_date.values().map(|&row| values[row]).collect();
                (name, picked)
            })
            .collect();

        Ok(Self { dates, columns })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn height(&self) -> usize {
        self.dates.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// True when there are no rows or no regressor columns
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.columns.is_empty()
    }

    /// Reindex onto `dates`; dates absent from this frame get missing cells
    pub fn reindex(&self, dates: &[NaiveDate]) -> Self {
        let position: BTreeMap<NaiveDate, usize> = self
            .dates
            .iter()
            .enumerate()
            .map(|(i, d)| (*d, i))
            .collect();

        let columns = self
            .columns
            .iter()
            .map(|(name, values)| {
                let picked = dates
                    .iter()
                    .map(|d| position.get(d).and_then(|&i| values[i]))
                    .collect();
                (name.clone(), picked)
            })
            .collect();

        Self {
            dates: dates.to_vec(),
            columns,
        }
    }

    /// Reindex to every calendar day between the first and last date
    pub fn to_daily(&self) -> Self {
        match (self.dates.first(), self.dates.last()) {
            (Some(first), Some(last)) => {
                let days: Vec<NaiveDate> = first.iter_days().take_while(|d| d <= last).collect();
                self.reindex(&days)
            }
            _ => self.clone(),
        }
    }

    /// Carry each value forward over following gaps
    pub fn forward_fill(&mut self) {
        for (_, values) in &mut self.columns {
            let mut last = None;
            for cell in values.iter_mut() {
                match cell {
                    Some(v) => last = Some(*v),
                    None => *cell = last,
                }
            }
        }
    }

    /// Carry each value backward over preceding gaps
    pub fn backward_fill(&mut self) {
        for (_, values) in &mut self.columns {
            let mut next = None;
            for cell in values.iter_mut().rev() {
                match cell {
                    Some(v) => next = Some(*v),
                    None => *cell = next,
                }
            }
        }
    }

    /// Outer join on date; the result spans the union of both date sets
    pub fn outer_join(&self, other: &Self) -> Result<Self> {
        if let Some(clash) = self
            .column_names()
            .into_iter()
            .find(|n| other.column(n).is_some())
        {
            return Err(ForecastError::DataError(format!(
                "Column '{}' present on both sides of join",
                clash
            )));
        }

        let union: BTreeSet<NaiveDate> = self.dates.iter().chain(&other.dates).copied().collect();
        let dates: Vec<NaiveDate> = union.into_iter().collect();

        let mut joined = self.reindex(&dates);
        joined.columns.extend(other.reindex(&dates).columns);
        Ok(joined)
    }

    /// Columns in the given order; names not present become all-missing columns
    pub fn select(&self, names: &[&str]) -> Self {
        let columns = names
            .iter()
            .map(|name| {
                let values = self
                    .column(name)
                    .map(|v| v.to_vec())
                    .unwrap_or_else(|| vec![None; self.height()]);
                (name.to_string(), values)
            })
            .collect();
        Self {
            dates: self.dates.clone(),
            columns,
        }
    }

    /// Append or replace a column
    pub fn with_column(mut self, name: &str, values: Vec<Option<f64>>) -> Result<Self> {
        if values.len() != self.height() {
            return Err(ForecastError::DataError(format!(
                "Column '{}' has {} values for {} dates",
                name,
                values.len(),
                self.height()
            )));
        }
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name.to_string(), values)),
        }
        Ok(self)
    }

    /// Exactly `rows` rows: truncated, or extended by repeating the last row on
    /// the following calendar days
    pub fn resized(&self, rows: usize) -> Self {
        let mut resized = self.clone();
        if rows <= self.height() {
            resized.dates.truncate(rows);
            for (_, values) in &mut resized.columns {
                values.truncate(rows);
            }
            return resized;
        }

        let Some(mut day) = self.dates.last().copied() else {
            return resized;
        };
        while resized.dates.len() < rows {
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
            resized.dates.push(day);
        }
        let target = resized.dates.len();
        for (_, values) in &mut resized.columns {
            let last = values.last().copied().flatten();
            values.resize(target, last);
        }
        resized
    }

    /// Rows from `start` onwards
    pub fn tail_from(&self, start: usize) -> Self {
        let start = start.min(self.height());
        Self {
            dates: self.dates[start..].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), values[start..].to_vec()))
                .collect(),
        }
    }

    /// Index of the first row where every column has a value
    pub fn first_complete_row(&self) -> Option<usize> {
        (0..self.height()).find(|&row| self.columns.iter().all(|(_, v)| v[row].is_some()))
    }

    pub fn has_missing(&self) -> bool {
        self.columns.iter().any(|(_, v)| v.iter().any(Option::is_none))
    }

    /// Values as dense columns, failing on any missing cell
    pub fn to_dense_columns(&self) -> Result<Vec<Vec<f64>>> {
        self.columns
            .iter()
            .map(|(name, values)| {
                values
                    .iter()
                    .enumerate()
                    .map(|(row, v)| {
                        v.ok_or_else(|| {
                            ForecastError::DataError(format!(
                                "Regressor '{}' is missing on {}",
                                name, self.dates[row]
                            ))
                        })
                    })
                    .collect()
            })
            .collect()
    }

    /// Write CSV with a leading `date` column; missing cells are left blank
    pub fn write_csv_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = vec!["date"];
        header.extend(self.column_names());
        csv_writer.write_record(&header)?;

        for (row, date) in self.dates.iter().enumerate() {
            let mut record = vec![date.to_string()];
            record.extend(
                self.columns
                    .iter()
                    .map(|(_, values)| values[row].map(|v| v.to_string()).unwrap_or_default()),
            );
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_csv_to(file)
    }

    /// Convert to a DataFrame with a leading `date` column
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut series = vec![date_series("date", &self.dates)?];
        for (name, values) in &self.columns {
            series.push(Series::new(name, values.clone()));
        }
        Ok(DataFrame::new(series)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_to_daily_and_forward_fill() {
        let frame = RegressorFrame::new(
            vec![day(1), day(4)],
            vec![("x".to_string(), vec![Some(1.0), Some(4.0)])],
        )
        .unwrap();

        let mut daily = frame.to_daily();
        assert_eq!(daily.height(), 4);
        assert!(daily.has_missing());

        daily.forward_fill();
        assert_eq!(daily.column("x").unwrap(), &[Some(1.0), Some(1.0), Some(1.0), Some(4.0)]);
    }

    #[test]
    fn test_backward_fill_only_fills_leading() {
        let mut frame = RegressorFrame::new(
            vec![day(1), day(2), day(3)],
            vec![("x".to_string(), vec![None, Some(2.0), None])],
        )
        .unwrap();
        frame.backward_fill();
        assert_eq!(frame.column("x").unwrap(), &[Some(2.0), Some(2.0), None]);
    }

    #[test]
    fn test_outer_join_union_of_dates() {
        let a = RegressorFrame::new(vec![day(1)], vec![("a".to_string(), vec![Some(1.0)])]).unwrap();
        let b = RegressorFrame::new(vec![day(2)], vec![("b".to_string(), vec![Some(2.0)])]).unwrap();

        let joined = a.outer_join(&b).unwrap();
        assert_eq!(joined.dates(), &[day(1), day(2)]);
        assert_eq!(joined.column_names(), vec!["a", "b"]);
        assert_eq!(joined.column("b").unwrap(), &[None, Some(2.0)]);
        assert!(a.outer_join(&a).is_err());
    }

    #[test]
    fn test_resized_repeats_last_row() {
        let frame = RegressorFrame::new(
            vec![day(1), day(2)],
            vec![("x".to_string(), vec![Some(1.0), Some(2.0)])],
        )
        .unwrap();

        let longer = frame.resized(4);
        assert_eq!(longer.dates(), &[day(1), day(2), day(3), day(4)]);
        assert_eq!(longer.column("x").unwrap(), &[Some(1.0), Some(2.0), Some(2.0), Some(2.0)]);

        let shorter = frame.resized(1);
        assert_eq!(shorter.height(), 1);
    }

    #[test]
    fn test_select_adds_missing_columns() {
        let frame = RegressorFrame::new(vec![day(1)], vec![("x".to_string(), vec![Some(1.0)])]).unwrap();
        let selected = frame.select(&["y", "x"]);
        assert_eq!(selected.column_names(), vec!["y", "x"]);
        assert_eq!(selected.column("y").unwrap(), &[None]);
    }

    #[test]
    fn test_csv_leaves_missing_blank() {
        let frame = RegressorFrame::new(
            vec![day(1), day(2)],
            vec![("x".to_string(), vec![Some(1.5), None])],
        )
        .unwrap();
        let mut buffer = Vec::new();
        frame.write_csv_to(&mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "date,x\n2024-03-01,1.5\n2024-03-02,\n"
        );
    }

    #[test]
    fn test_first_complete_row() {
        let frame = RegressorFrame::new(
            vec![day(1), day(2), day(3)],
            vec![
                ("a".to_string(), vec![None, Some(1.0), Some(1.0)]),
                ("b".to_string(), vec![Some(1.0), None, Some(1.0)]),
            ],
        )
        .unwrap();
        assert_eq!(frame.first_complete_row(), Some(2));
    }
}
