use price_forecast::{
    DataLoader, ExogenousForecaster, ForecastStatus, ForecastSummary, RegressorFrame, UnivariateForecaster,
};
use std::io::Write;
use tempfile::NamedTempFile;

// Two months of quotes with a missing weekend and an unparseable row
fn create_sample_data() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,Open,Close,Volume").unwrap();
    for day in 0..60u32 {
        if day % 7 == 5 || day % 7 == 6 {
            continue;
        }
        let date = chrono::NaiveDate::from_ymd_opt(2023, 3, 1).unwrap() + chrono::Duration::days(day as i64);
        let close = 70.0 + (day as f64 * 0.7).sin() * 2.0 + day as f64 * 0.05;
        writeln!(file, "{},{:.2},{:.2},{}", date, close - 0.3, close, 1000 + day).unwrap();
    }
    writeln!(file, "oops,1.0,2.0,3").unwrap();
    file
}

fn create_regressors(start_day: i64, days: i64) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,temp_avg,precip_avg,news_sentiment").unwrap();
    for day in start_day..start_day + days {
        let date = chrono::NaiveDate::from_ymd_opt(2023, 3, 1).unwrap() + chrono::Duration::days(day);
        writeln!(
            file,
            "{},{:.2},{:.2},{:.3}",
            date,
            12.0 + (day as f64 / 5.0).cos() * 4.0,
            (day % 4) as f64 * 0.8,
            ((day * 37) % 11) as f64 / 10.0 - 0.5
        )
        .unwrap();
    }
    file
}

#[test]
fn test_full_forecast_workflow() {
    let data_file = create_sample_data();
    let prices = DataLoader::prices_from_csv(data_file.path()).unwrap();
    assert!(prices.len() >= 57);

    let forecaster = UnivariateForecaster::new().with_horizons(&[7, 30]).unwrap();
    let forecast = forecaster.forecast(&prices).unwrap();
    assert_eq!(forecast.status(), ForecastStatus::Fitted);

    let summary = ForecastSummary::from_forecast(prices.last_value(), &forecast);
    assert_eq!(summary.longest_horizon, Some(30));
    assert!(summary.next_day.is_some());

    let out_dir = tempfile::tempdir().unwrap();
    for (h, table) in forecast.tables() {
        let path = out_dir.path().join(format!("sample_forecast_{}d.csv", h));
        table.write_csv(&path).unwrap();
        let reloaded = DataLoader::from_csv(&path).unwrap();
        assert_eq!(reloaded.height(), *h);
    }
}

#[test]
fn test_full_exogenous_workflow() {
    let data_file = create_sample_data();
    let past_file = create_regressors(0, 60);
    let future_file = create_regressors(60, 5);

    let prices = DataLoader::prices_from_csv(data_file.path()).unwrap();
    let past = RegressorFrame::from_dataframe(&DataLoader::from_csv(past_file.path()).unwrap()).unwrap();
    let future = RegressorFrame::from_dataframe(&DataLoader::from_csv(future_file.path()).unwrap()).unwrap();
    assert_eq!(past.column_names(), vec!["temp_avg", "precip_avg", "news_sentiment"]);

    let last_date = prices.last_date().unwrap();
    let result = ExogenousForecaster::new().forecast(prices, &past, &future, 16).unwrap();

    assert_eq!(result.status, ForecastStatus::Fitted);
    assert_eq!(result.table.len(), 16);
    assert_eq!(result.table.first().unwrap().date, last_date.succ_opt().unwrap());

    let json = result.table.to_json().unwrap();
    assert!(json.starts_with("[{\"date\":"));
}
