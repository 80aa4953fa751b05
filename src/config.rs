//! Runtime configuration
//!
//! Settings come from a TOML file named on the command line or in the
//! `COMMODITY_FORECAST_CONFIG` environment variable. Every field has a
//! default, so a partial file or no file at all is fine.

use exog_features::FeatureWindow;
use price_forecast::HORIZONS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable holding the config file path
pub const CONFIG_ENV: &str = "COMMODITY_FORECAST_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSection {
    /// Forecast horizons in days
    pub horizons: Vec<usize>,
    /// Directory receiving exported CSV files
    pub output_dir: PathBuf,
}

impl Default for ForecastSection {
    fn default() -> Self {
        Self {
            horizons: HORIZONS.to_vec(),
            output_dir: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSection {
    pub days_back: u32,
    pub days_forward: u32,
}

impl Default for FeatureSection {
    fn default() -> Self {
        let window = FeatureWindow::default();
        Self {
            days_back: window.days_back,
            days_forward: window.days_forward,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub forecast: ForecastSection,
    pub features: FeatureSection,
}

impl ForecastConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ForecastConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load from `path`, else from the path in [`CONFIG_ENV`], else defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.forecast.horizons.is_empty() {
            return Err(ConfigError::Invalid("forecast.horizons must not be empty".to_string()));
        }
        if self.forecast.horizons.contains(&0) {
            return Err(ConfigError::Invalid("forecast.horizons must be positive".to_string()));
        }
        self.feature_window()?;
        Ok(())
    }

    pub fn feature_window(&self) -> Result<FeatureWindow, ConfigError> {
        FeatureWindow::new(self.features.days_back, self.features.days_forward)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ForecastConfig::default();
        assert_eq!(config.forecast.horizons, vec![7, 30, 180, 365]);
        assert_eq!(config.features.days_back, 120);
        assert_eq!(config.features.days_forward, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let config = ForecastConfig::from_toml_str(
            r#"
            [forecast]
            horizons = [7, 30]

            [features]
            days_forward = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.forecast.horizons, vec![7, 30]);
        assert_eq!(config.forecast.output_dir, PathBuf::from("output"));
        assert_eq!(config.features.days_back, 120);
        assert_eq!(config.features.days_forward, 10);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            ForecastConfig::from_toml_str("[forecast]\nhorizons = []"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ForecastConfig::from_toml_str("[forecast]\nhorizons = [0, 7]"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ForecastConfig::from_toml_str("[features]\ndays_back = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ForecastConfig::from_toml_str("[forecast]\nhorizons = \"weekly\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[forecast]\noutput_dir = \"exports\"").unwrap();
        let config = ForecastConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.forecast.output_dir, PathBuf::from("exports"));

        assert!(matches!(
            ForecastConfig::from_file(Path::new("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
