//! End-to-end run: load series, train incrementally, validate, forecast.

use chrono::NaiveDate;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{ForecastError, Result};
use crate::forecast::{ForecastEngine, ForecastPoint};
use crate::series::SeriesLoader;
use crate::state::ModelStateStore;
use crate::trainer::IncrementalTrainer;
use crate::validate::{ValidationMetrics, Validator};

/// Everything one pipeline run produces.
#[derive(Debug)]
pub struct PipelineReport {
    /// Whether this run committed a training pass
    pub trained: bool,
    /// Watermark after the run
    pub watermark: NaiveDate,
    /// In-sample metrics; `None` when the series has no window to replay
    pub metrics: Option<ValidationMetrics>,
    /// Forecast points, one per horizon day
    pub forecast: Vec<ForecastPoint>,
}

/// Run the whole pipeline once.
///
/// Training and validation quietly skip when the series is too short, but
/// the forecast still runs as long as one full window of observations
/// exists; the caller gets a report either way.
pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    config.validate()?;

    let series = SeriesLoader::from_csv(&config.series_path)?;
    info!(
        observations = series.len(),
        last_date = %series.last_date(),
        mean = series.mean(),
        std_dev = series.std_dev(),
        "series loaded"
    );

    let store = ModelStateStore::new(&config.model_path, &config.watermark_path);
    let trainer = IncrementalTrainer::from_config(config)?;
    let outcome = trainer.run(&series, &store)?;

    let metrics = match Validator::new(config.window_size).evaluate(&outcome.artifact.network, &series)
    {
        Ok(metrics) => {
            info!(rmse = metrics.rmse, mae = metrics.mae, "validation replay complete");
            Some(metrics)
        }
        Err(ForecastError::InsufficientData(reason)) => {
            info!(reason = %reason, "validation skipped");
            None
        }
        Err(err) => return Err(err),
    };

    let engine = ForecastEngine::new(config.window_size, config.forecast_days);
    let forecast = engine.forecast(&outcome.artifact.network, &series)?;
    info!(days = forecast.len(), "forecast rolled out");

    Ok(PipelineReport {
        trained: outcome.trained,
        watermark: outcome.artifact.watermark,
        metrics,
        forecast,
    })
}
