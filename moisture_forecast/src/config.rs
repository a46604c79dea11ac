//! Pipeline configuration with production defaults and TOML overrides.

use std::path::{Path, PathBuf};

use moisture_model::{FitOptions, NetworkShape};
use serde::Deserialize;

use crate::error::{ForecastError, Result};

/// Every tunable of the pipeline.
///
/// The defaults mirror the production setup: 7-day windows, a 30-day
/// horizon, 100 epochs per pass in batches of 16. A TOML file may override
/// any subset of fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Input series CSV with `ds,y` columns
    pub series_path: PathBuf,
    /// Persisted model artifact (JSON)
    pub model_path: PathBuf,
    /// Watermark sidecar holding one ISO date
    pub watermark_path: PathBuf,
    /// Forecast CSV written by the runner
    pub forecast_path: PathBuf,
    /// Past values fed into each prediction
    pub window_size: usize,
    /// Days to roll the forecast forward
    pub forecast_days: usize,
    /// Optimization epochs per training pass
    pub epochs: usize,
    /// Windows per gradient step
    pub batch_size: usize,
    /// Adam step size
    pub learning_rate: f64,
    /// Dropout rate on the final hidden state
    pub dropout: f64,
    /// Units in the first recurrent layer
    pub hidden1: usize,
    /// Units in the second recurrent layer
    pub hidden2: usize,
    /// Seed for weight init and dropout masks
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            series_path: PathBuf::from("sm_series.csv"),
            model_path: PathBuf::from("sm_model.json"),
            watermark_path: PathBuf::from("last_trained_date.txt"),
            forecast_path: PathBuf::from("sm_forecast.csv"),
            window_size: 7,
            forecast_days: 30,
            epochs: 100,
            batch_size: 16,
            learning_rate: 1e-3,
            dropout: 0.2,
            hidden1: 50,
            hidden2: 25,
            seed: 42,
        }
    }
}

impl PipelineConfig {
    /// Read and validate a TOML config file. Missing fields keep their
    /// defaults.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = toml::from_str(&raw)
            .map_err(|e| ForecastError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(ForecastError::Config(
                "window_size must be at least 1".to_string(),
            ));
        }
        if self.forecast_days == 0 {
            return Err(ForecastError::Config(
                "forecast_days must be at least 1".to_string(),
            ));
        }
        self.network_shape().validate()?;
        self.fit_options().validate()?;
        Ok(())
    }

    /// Architecture slice of the config.
    pub fn network_shape(&self) -> NetworkShape {
        NetworkShape {
            hidden1: self.hidden1,
            hidden2: self.hidden2,
            dropout: self.dropout,
        }
    }

    /// Training slice of the config.
    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            epochs: self.epochs,
            batch_size: self.batch_size,
            learning_rate: self.learning_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_production_setup() {
        let config = PipelineConfig::default();
        assert_eq!(config.window_size, 7);
        assert_eq!(config.forecast_days, 30);
        assert_eq!(config.epochs, 100);
        assert_eq!(config.batch_size, 16);
        assert_eq!(config.series_path, PathBuf::from("sm_series.csv"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_overrides_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "window_size = 5").unwrap();
        writeln!(file, "forecast_days = 10").unwrap();
        writeln!(file, "series_path = \"data/moisture.csv\"").unwrap();
        file.flush().unwrap();

        let config = PipelineConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.window_size, 5);
        assert_eq!(config.forecast_days, 10);
        assert_eq!(config.series_path, PathBuf::from("data/moisture.csv"));
        // untouched fields keep their defaults
        assert_eq!(config.epochs, 100);
        assert_eq!(config.hidden1, 50);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "window_sise = 5").unwrap();
        file.flush().unwrap();

        let result = PipelineConfig::from_toml_file(file.path());
        assert!(matches!(result, Err(ForecastError::Config(_))));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let bad_window = PipelineConfig {
            window_size: 0,
            ..PipelineConfig::default()
        };
        assert!(bad_window.validate().is_err());

        let bad_days = PipelineConfig {
            forecast_days: 0,
            ..PipelineConfig::default()
        };
        assert!(bad_days.validate().is_err());

        let bad_dropout = PipelineConfig {
            dropout: 1.5,
            ..PipelineConfig::default()
        };
        assert!(bad_dropout.validate().is_err());

        let bad_lr = PipelineConfig {
            learning_rate: -0.1,
            ..PipelineConfig::default()
        };
        assert!(bad_lr.validate().is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let result = PipelineConfig::from_toml_file("no/such/config.toml");
        assert!(matches!(result, Err(ForecastError::Io(_))));
    }
}
