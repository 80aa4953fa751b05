use chrono::NaiveDate;
use price_forecast::forecast::UnivariateForecaster;
use price_forecast::utils::generate_price_table;
use price_forecast::{ForecastSummary, PriceSeries};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Price Forecast: Basic Forecasting Example");
    println!("=========================================\n");

    let start = NaiveDate::from_ymd_opt(2023, 1, 1).ok_or("invalid start date")?;
    let raw = generate_price_table(start, 400, 78.0, 0.012, 42)?;
    let series = PriceSeries::from_dataframe(&raw)?;
    println!(
        "Normalized {} daily prices from {} to {}\n",
        series.len(),
        start,
        series.last_date().ok_or("empty series")?
    );

    let forecast = UnivariateForecaster::new().forecast(&series)?;
    println!("Status: {}\n", forecast.status());

    if let Some(week) = forecast.table(7) {
        println!("{:<12} {:>9} {:>9} {:>9} {:>9} {:>9}", "date", "mean", "lower80", "upper80", "lower95", "upper95");
        for row in week.rows() {
            println!(
                "{:<12} {:>9.2} {:>9.2} {:>9.2} {:>9.2} {:>9.2}",
                row.date, row.mean, row.lower80, row.upper80, row.lower95, row.upper95
            );
        }
    }

    let summary = ForecastSummary::from_forecast(series.last_value(), &forecast);
    println!("\nSummary: {}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
