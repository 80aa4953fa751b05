use chrono::NaiveDate;
use polars::prelude::*;
use price_forecast::exog::{align_exogenous, forecast_with_exog, ExogenousForecaster};
use price_forecast::table::{ForecastStatus, TableRow};
use price_forecast::utils::{daily_dates, synthetic_prices};
use price_forecast::{PriceSeries, RegressorFrame};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn date_strings(from: NaiveDate, count: usize) -> Vec<String> {
    daily_dates(from, count).iter().map(|d| d.to_string()).collect()
}

/// Prices driven by temperature plus a random walk
fn inputs(days: usize) -> (DataFrame, DataFrame) {
    let temps: Vec<f64> = (0..days).map(|i| 15.0 + 10.0 * ((i as f64) / 9.0).sin()).collect();
    let walk = synthetic_prices(days, 60.0, 0.01, 21).unwrap();
    let prices: Vec<f64> = walk.iter().zip(&temps).map(|(p, t)| p + 0.3 * t).collect();

    let price_df = df!(
        "Date" => date_strings(start(), days),
        "Close" => prices
    )
    .unwrap();
    let past_df = df!(
        "date" => date_strings(start(), days),
        "temp_avg" => temps,
        "note" => vec!["x"; days]
    )
    .unwrap();
    (price_df, past_df)
}

fn future_table(rows: usize) -> DataFrame {
    let first = start() + chrono::Duration::days(200);
    df!(
        "date" => date_strings(first, rows),
        "temp_avg" => vec![20.0; rows]
    )
    .unwrap()
}

#[test]
fn test_short_future_is_extended_to_horizon() {
    let (price_df, past_df) = inputs(120);
    let result = forecast_with_exog(&price_df, &past_df, &future_table(5), 16).unwrap();

    assert_eq!(result.status, ForecastStatus::Fitted);
    assert_eq!(result.table.len(), 16);

    let last_price_date = start() + chrono::Duration::days(119);
    assert_eq!(result.table.first().unwrap().date, last_price_date.succ_opt().unwrap());
    assert!(result.table.rows().iter().all(TableRow::is_ordered));
}

#[test]
fn test_long_future_is_truncated() {
    let (price_df, past_df) = inputs(90);
    let result = forecast_with_exog(&price_df, &past_df, &future_table(40), 10).unwrap();
    assert_eq!(result.table.len(), 10);
    assert_eq!(
        result.table.to_dataframe().unwrap().get_column_names(),
        vec!["date", "mean", "lower95", "upper95"]
    );
}

#[test]
fn test_aligner_keeps_leading_gap() {
    let price_df = df!(
        "date" => date_strings(start(), 10),
        "price" => vec![50.0; 10]
    )
    .unwrap();
    let regressor_df = df!(
        "date" => date_strings(start() + chrono::Duration::days(3), 4),
        "news_sentiment" => &[0.1, 0.2, 0.3, 0.4]
    )
    .unwrap();

    let aligned = align_exogenous(&price_df, &regressor_df).unwrap();
    let column = aligned.regressors.column("news_sentiment").unwrap();

    assert_eq!(aligned.regressors.dates(), aligned.prices.dates());
    assert!(column[..3].iter().all(Option::is_none));
    assert_eq!(column[3], Some(0.1));
    // carried forward past the end of the regressor table
    assert_eq!(column[9], Some(0.4));
}

#[test]
fn test_non_numeric_regressors_give_no_data() {
    let (price_df, _) = inputs(60);
    let past_df = df!(
        "date" => date_strings(start(), 60),
        "label" => vec!["a"; 60]
    )
    .unwrap();

    let result = forecast_with_exog(&price_df, &past_df, &future_table(5), 7).unwrap();
    assert_eq!(result.status, ForecastStatus::NoExogenousData);
    assert!(result.table.is_empty());
}

#[test]
fn test_empty_prices_give_no_data() {
    let (_, past_df) = inputs(30);
    let price_df = df!(
        "Date" => &["bad"],
        "Close" => &[1.0]
    )
    .unwrap();

    let result = forecast_with_exog(&price_df, &past_df, &future_table(5), 7).unwrap();
    assert_eq!(result.status, ForecastStatus::NoExogenousData);
}

#[test]
fn test_empty_future_gives_no_data() {
    let (price_df, past_df) = inputs(60);
    let prices = PriceSeries::from_dataframe(&price_df).unwrap();
    let past = RegressorFrame::from_dataframe(&past_df).unwrap();

    let result = ExogenousForecaster::new()
        .forecast(prices, &past, &RegressorFrame::default(), 7)
        .unwrap();
    assert_eq!(result.status, ForecastStatus::NoExogenousData);
}
