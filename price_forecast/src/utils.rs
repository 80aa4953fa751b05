//! Utility functions for the price_forecast crate

use crate::data::date_series;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// `count` consecutive calendar days starting at `start`
pub fn daily_dates(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    start.iter_days().take(count).collect()
}

/// File name of an exported univariate forecast, e.g. `wti_forecast_30d.csv`
pub fn export_file_name(name: &str, horizon: usize) -> String {
    format!("{}_forecast_{}d.csv", name, horizon)
}

/// File name of an exported exogenous forecast, e.g. `wti_forecast_exog_16d.csv`
pub fn exog_export_file_name(name: &str, horizon: usize) -> String {
    format!("{}_forecast_exog_{}d.csv", name, horizon)
}

/// Generate a reproducible daily price path for testing purposes
///
/// # Arguments
/// * `num_points` - Number of daily prices to generate
/// * `starting_price` - Price on the first day
/// * `volatility` - Standard deviation of daily returns
/// * `seed` - Seed of the random generator
///
/// # Returns
/// * Prices with a mild weekly cycle on top of a geometric random walk
pub fn synthetic_prices(num_points: usize, starting_price: f64, volatility: f64, seed: u64) -> Result<Vec<f64>> {
    let returns = Normal::new(0.0, volatility)
        .map_err(|e| ForecastError::InvalidParameter(format!("Invalid volatility: {}", e)))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let weekly = [0.0, 0.004, 0.006, 0.002, -0.002, -0.006, -0.004];
    let mut level = starting_price;
    let prices = (0..num_points)
        .map(|i| {
            if i > 0 {
                level *= 1.0 + returns.sample(&mut rng);
            }
            level * (1.0 + weekly[i % 7])
        })
        .collect();
    Ok(prices)
}

/// Driftless Gaussian random walk: `p_t = p_{t-1} + e_t`, `e_t ~ N(0, step_sd)`
pub fn random_walk(num_points: usize, starting_price: f64, step_sd: f64, seed: u64) -> Result<Vec<f64>> {
    let steps = Normal::new(0.0, step_sd)
        .map_err(|e| ForecastError::InvalidParameter(format!("Invalid step deviation: {}", e)))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut level = starting_price;
    let prices = (0..num_points)
        .map(|i| {
            if i > 0 {
                level += steps.sample(&mut rng);
            }
            level
        })
        .collect();
    Ok(prices)
}

/// Synthetic raw price table with `Date` and `Close` columns
pub fn generate_price_table(
    start: NaiveDate,
    num_points: usize,
    starting_price: f64,
    volatility: f64,
    seed: u64,
) -> Result<DataFrame> {
    let dates = daily_dates(start, num_points);
    let prices = synthetic_prices(num_points, starting_price, volatility, seed)?;
    let df = DataFrame::new(vec![date_series("Date", &dates)?, Series::new("Close", prices)])?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_names() {
        assert_eq!(export_file_name("brent", 7), "brent_forecast_7d.csv");
        assert_eq!(exog_export_file_name("brent", 16), "brent_forecast_exog_16d.csv");
    }

    #[test]
    fn test_synthetic_prices_are_seeded() {
        let a = synthetic_prices(50, 70.0, 0.01, 1).unwrap();
        let b = synthetic_prices(50, 70.0, 0.01, 1).unwrap();
        let c = synthetic_prices(50, 70.0, 0.01, 2).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(synthetic_prices(5, 70.0, -1.0, 1).is_err());
    }

    #[test]
    fn test_random_walk_is_seeded() {
        let a = random_walk(100, 50.0, 1.0, 4).unwrap();
        assert_eq!(a, random_walk(100, 50.0, 1.0, 4).unwrap());
        assert_eq!(a[0], 50.0);
        assert!(a.windows(2).any(|w| w[1] < w[0]));
        assert!(random_walk(10, 50.0, -1.0, 4).is_err());
    }

    #[test]
    fn test_daily_dates() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let dates = daily_dates(start, 3);
        assert_eq!(dates[2], NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }
}
