use chrono::NaiveDate;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use price_forecast::data::{parse_date, resolve_date_column, resolve_price_column, DataLoader, PriceSeries};
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[rstest]
#[case(&["Date", "Open", "Close", "Adj Close"], "Close")]
#[case(&["timestamp", "SETTLE", "volume"], "SETTLE")]
#[case(&["day", " price ", "close"], " price ")]
#[case(&["day", "open", "brent_usd"], "brent_usd")]
fn test_price_column_resolution(#[case] columns: &[&str], #[case] expected: &str) {
    assert_eq!(resolve_price_column(columns).as_deref(), Some(expected));
}

#[rstest]
#[case(&["Open", "Date", "Close"], "Date")]
#[case(&["Time", "value"], "Time")]
#[case(&["period", "value"], "period")]
fn test_date_column_resolution(#[case] columns: &[&str], #[case] expected: &str) {
    assert_eq!(resolve_date_column(columns).as_deref(), Some(expected));
}

#[rstest]
#[case("2024-03-05", Some(date(2024, 3, 5)))]
#[case("2024/03/05", Some(date(2024, 3, 5)))]
#[case("03/05/2024", Some(date(2024, 3, 5)))]
#[case("20240305", Some(date(2024, 3, 5)))]
#[case("2024-03-05 16:30:00", Some(date(2024, 3, 5)))]
#[case("2024-03-05T23:30:00+00:00", Some(date(2024, 3, 5)))]
#[case("2024-03", Some(date(2024, 3, 1)))]
#[case("not a date", None)]
#[case("", None)]
fn test_parse_date(#[case] raw: &str, #[case] expected: Option<NaiveDate>) {
    assert_eq!(parse_date(raw), expected);
}

#[test]
fn test_malformed_rows_are_dropped() {
    let df = df!(
        "Date" => &["2024-01-01", "garbage", "2024-01-03", "2024-01-04"],
        "Close" => &["10.0", "11.0", "n/a", "13.0"]
    )
    .unwrap();

    let series = PriceSeries::from_dataframe(&df).unwrap();
    assert_eq!(series.first_date(), Some(date(2024, 1, 1)));
    assert_eq!(series.last_date(), Some(date(2024, 1, 4)));
    // 2nd and 3rd rows are unusable, so Jan 2-3 carry Jan 1 forward
    assert_eq!(series.values(), &[10.0, 10.0, 10.0, 13.0]);
}

#[test]
fn test_unsorted_input_with_gaps() {
    let df = df!(
        "price" => &[3.0, 1.0, 2.0],
        "date" => &["2024-02-10", "2024-02-01", "2024-02-05"]
    )
    .unwrap();

    let series = PriceSeries::from_dataframe(&df).unwrap();
    assert_eq!(series.len(), 10);
    assert!(series.dates().windows(2).all(|w| w[1] == w[0].succ_opt().unwrap()));
    assert_eq!(series.values()[3], 1.0);
    assert_eq!(series.values()[4], 2.0);
    assert_eq!(series.values()[9], 3.0);
}

#[test]
fn test_no_usable_rows_gives_empty_series() {
    let df = df!(
        "Date" => &["x", "y"],
        "Close" => &[1.0, 2.0]
    )
    .unwrap();
    assert!(PriceSeries::from_dataframe(&df).unwrap().is_empty());
    assert!(PriceSeries::from_dataframe(&DataFrame::default()).unwrap().is_empty());
}

#[test]
fn test_normalization_is_idempotent() {
    let df = df!(
        "Settle" => &[5.0, 7.0, 6.0, 8.0],
        "Timestamp" => &["2024-04-01", "2024-04-04", "2024-04-02", "2024-04-09"],
        "Volume" => &[1i64, 2, 3, 4]
    )
    .unwrap();

    let once = PriceSeries::from_dataframe(&df).unwrap();
    let twice = PriceSeries::from_dataframe(&once.to_dataframe().unwrap()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_data_loader_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,Open,Close").unwrap();
    writeln!(file, "2023-01-01,100.0,103.0").unwrap();
    writeln!(file, "2023-01-02,103.0,106.0").unwrap();
    writeln!(file, "2023-01-04,106.0,108.0").unwrap();

    let series = DataLoader::prices_from_csv(file.path()).unwrap();
    assert_eq!(series.len(), 4);
    assert_eq!(series.values(), &[103.0, 106.0, 106.0, 108.0]);
}

#[test]
fn test_data_loader_missing_file() {
    assert!(DataLoader::from_csv("nonexistent_file.csv").is_err());
}
