use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use commodity_forecast::config::ForecastConfig;
use exog_features::{FeatureAssembler, Headline, RegionWeather, VaderScorer};
use price_forecast::utils::{exog_export_file_name, export_file_name};
use price_forecast::{DataLoader, ExogenousForecaster, ForecastSummary, RegressorFrame, UnivariateForecaster};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML config file (falls back to $COMMODITY_FORECAST_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast a price table over every horizon and export one CSV per horizon
    Forecast {
        /// Price table (CSV with a date-like and a price-like column)
        #[arg(long)]
        input: PathBuf,
        /// Comma-separated horizons in days, e.g. 7,30
        #[arg(long, value_delimiter = ',')]
        horizons: Option<Vec<usize>>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Prefix of exported files (defaults to the input file stem)
        #[arg(long)]
        name: Option<String>,
    },
    /// Forecast with past and future regressor tables
    ForecastExog {
        #[arg(long)]
        input: PathBuf,
        /// Past regressors aligned with the price history
        #[arg(long)]
        past: PathBuf,
        /// Regressor values for the forecast window
        #[arg(long)]
        future: PathBuf,
        /// Defaults to the configured look-ahead window
        #[arg(long, value_delimiter = ',')]
        horizons: Option<Vec<usize>>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Build past and future regressor tables from weather and news
    Features {
        /// Date the tables are built for (YYYY-MM-DD)
        #[arg(long)]
        as_of: NaiveDate,
        /// Weather history as region=path, repeatable
        #[arg(long = "weather", value_parser = parse_region)]
        weather: Vec<(String, PathBuf)>,
        /// Weather forecast as region=path, repeatable
        #[arg(long = "weather-forecast", value_parser = parse_region)]
        weather_forecast: Vec<(String, PathBuf)>,
        /// Headline table with title, summary and published columns
        #[arg(long)]
        headlines: Option<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

fn parse_region(raw: &str) -> Result<(String, PathBuf), String> {
    match raw.split_once('=') {
        Some((region, path)) if !region.trim().is_empty() && !path.trim().is_empty() => {
            Ok((region.trim().to_string(), PathBuf::from(path.trim())))
        }
        _ => Err(format!("expected region=path, got '{}'", raw)),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn series_name(name: Option<String>, input: &Path) -> String {
    name.unwrap_or_else(|| {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "series".to_string())
    })
}

fn prepare_output_dir(dir: Option<PathBuf>, config: &ForecastConfig) -> anyhow::Result<PathBuf> {
    let dir = dir.unwrap_or_else(|| config.forecast.output_dir.clone());
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir)
}

fn run_forecast(
    config: &ForecastConfig,
    input: PathBuf,
    horizons: Option<Vec<usize>>,
    output_dir: Option<PathBuf>,
    name: Option<String>,
) -> anyhow::Result<()> {
    let horizons = horizons.unwrap_or_else(|| config.forecast.horizons.clone());
    let output_dir = prepare_output_dir(output_dir, config)?;
    let name = series_name(name, &input);

    let prices = DataLoader::prices_from_csv(&input)
        .with_context(|| format!("Failed to load prices from {}", input.display()))?;
    let forecast = UnivariateForecaster::new()
        .with_horizons(&horizons)?
        .forecast(&prices)
        .context("Univariate forecast failed")?;

    for (horizon, table) in forecast.tables() {
        let path = output_dir.join(export_file_name(&name, *horizon));
        table
            .write_csv(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), rows = table.len(), "wrote forecast");
    }

    let summary = ForecastSummary::from_forecast(prices.last_value(), &forecast);
    info!(
        status = %summary.status,
        last_actual = ?summary.last_actual,
        next_day = ?summary.next_day,
        horizon_end = ?summary.horizon_end,
        change_pct = ?summary.horizon_change_pct,
        "forecast summary"
    );
    Ok(())
}

fn run_forecast_exog(
    config: &ForecastConfig,
    input: PathBuf,
    past: PathBuf,
    future: PathBuf,
    horizons: Option<Vec<usize>>,
    output_dir: Option<PathBuf>,
    name: Option<String>,
) -> anyhow::Result<()> {
    let horizons = horizons.unwrap_or_else(|| vec![config.features.days_forward as usize]);
    let output_dir = prepare_output_dir(output_dir, config)?;
    let name = series_name(name, &input);

    let prices = DataLoader::prices_from_csv(&input)
        .with_context(|| format!("Failed to load prices from {}", input.display()))?;
    let past = DataLoader::from_csv(&past)
        .and_then(|df| RegressorFrame::from_dataframe(&df))
        .with_context(|| format!("Failed to load past regressors from {}", past.display()))?;
    let future = DataLoader::from_csv(&future)
        .and_then(|df| RegressorFrame::from_dataframe(&df))
        .with_context(|| format!("Failed to load future regressors from {}", future.display()))?;

    let forecaster = ExogenousForecaster::new();
    for horizon in horizons {
        let result = forecaster
            .forecast(prices.clone(), &past, &future, horizon)
            .with_context(|| format!("Exogenous forecast for {} days failed", horizon))?;

        let path = output_dir.join(exog_export_file_name(&name, horizon));
        result
            .table
            .write_csv(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), status = %result.status, rows = result.table.len(), "wrote exogenous forecast");
    }
    Ok(())
}

fn load_regions(specs: &[(String, PathBuf)]) -> anyhow::Result<Vec<RegionWeather>> {
    specs
        .iter()
        .map(|(region, path)| {
            let df = DataLoader::from_csv(path).with_context(|| format!("Failed to load weather from {}", path.display()))?;
            RegionWeather::from_dataframe(region.as_str(), &df)
                .with_context(|| format!("Invalid weather table {}", path.display()))
        })
        .collect()
}

fn run_features(
    config: &ForecastConfig,
    as_of: NaiveDate,
    weather: Vec<(String, PathBuf)>,
    weather_forecast: Vec<(String, PathBuf)>,
    headlines: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let output_dir = prepare_output_dir(output_dir, config)?;
    let past_weather = load_regions(&weather)?;
    let forecast_weather = load_regions(&weather_forecast)?;

    let headlines = match headlines {
        Some(path) => {
            let df = DataLoader::from_csv(&path)
                .with_context(|| format!("Failed to load headlines from {}", path.display()))?;
            Headline::from_dataframe(&df)?
        }
        None => Vec::new(),
    };

    let scorer = VaderScorer::new();
    let assembler = FeatureAssembler::new(&scorer, config.feature_window()?);
    let features = assembler.assemble(as_of, &past_weather, &forecast_weather, &headlines)?;

    let past_path = output_dir.join("exog_past.csv");
    let future_path = output_dir.join("exog_future.csv");
    features
        .past
        .write_csv(&past_path)
        .with_context(|| format!("Failed to write {}", past_path.display()))?;
    features
        .future
        .write_csv(&future_path)
        .with_context(|| format!("Failed to write {}", future_path.display()))?;

    info!(
        past = %past_path.display(),
        future = %future_path.display(),
        "wrote exogenous feature tables"
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = ForecastConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Forecast {
            input,
            horizons,
            output_dir,
            name,
        } => run_forecast(&config, input, horizons, output_dir, name),
        Commands::ForecastExog {
            input,
            past,
            future,
            horizons,
            output_dir,
            name,
        } => run_forecast_exog(&config, input, past, future, horizons, output_dir, name),
        Commands::Features {
            as_of,
            weather,
            weather_forecast,
            headlines,
            output_dir,
        } => run_features(&config, as_of, weather, weather_forecast, headlines, output_dir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_region() {
        assert_eq!(
            parse_region("Can Tho=data/can_tho.csv"),
            Ok(("Can Tho".to_string(), PathBuf::from("data/can_tho.csv")))
        );
        assert!(parse_region("no-separator").is_err());
        assert!(parse_region("=path.csv").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from([
            "commodity-forecast",
            "forecast",
            "--input",
            "wti.csv",
            "--horizons",
            "7,30",
        ]);
        match cli.command {
            Commands::Forecast { horizons, .. } => assert_eq!(horizons, Some(vec![7, 30])),
            _ => panic!("Expected forecast subcommand"),
        }

        let cli = Cli::parse_from([
            "commodity-forecast",
            "features",
            "--as-of",
            "2024-09-01",
            "--weather",
            "Karnal=karnal.csv",
            "--weather",
            "Bangkok=bangkok.csv",
        ]);
        match cli.command {
            Commands::Features { weather, as_of, .. } => {
                assert_eq!(weather.len(), 2);
                assert_eq!(as_of, NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());
            }
            _ => panic!("Expected features subcommand"),
        }
    }

    #[test]
    fn test_series_name_from_input() {
        assert_eq!(series_name(None, Path::new("data/brent.csv")), "brent");
        assert_eq!(series_name(Some("rice".to_string()), Path::new("x.csv")), "rice");
    }
}
