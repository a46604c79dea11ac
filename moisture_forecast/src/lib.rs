//! # Moisture Forecast
//!
//! Incremental training and autoregressive forecasting for a daily
//! soil-moisture series.
//!
//! The pipeline keeps a small recurrent model on disk next to a watermark
//! recording the newest observation it has seen. Each run loads the series
//! export, trains only on observations past the watermark, replays the
//! model over history for RMSE/MAE, and rolls the model forward day by day
//! to produce the forecast.
//!
//! ## Features
//!
//! - **Incremental training**: only the unseen tail is trained, with a
//!   lookback so every new observation gets a full input window
//! - **Crash safety**: artifact and watermark commit via temp file and
//!   atomic rename
//! - **Determinism**: a fixed seed makes weights, masks, and forecasts
//!   reproducible
//! - **Cold start**: with no state on disk the whole series counts as
//!   unseen and training starts from scratch
//!
//! ## Quick Start
//!
//! ```no_run
//! use moisture_forecast::{pipeline, PipelineConfig};
//!
//! fn main() -> Result<(), moisture_forecast::ForecastError> {
//!     let config = PipelineConfig::default();
//!     let report = pipeline::run(&config)?;
//!     if let Some(metrics) = &report.metrics {
//!         println!("{}", metrics);
//!     }
//!     for point in report.forecast.iter().take(5) {
//!         println!("{} -> {:.4}", point.date, point.predicted);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod forecast;
pub mod pipeline;
pub mod series;
pub mod state;
pub mod trainer;
pub mod validate;

pub use config::PipelineConfig;
pub use error::{ForecastError, Result};
pub use forecast::{write_forecast_csv, ForecastEngine, ForecastPoint, Rollout};
pub use pipeline::PipelineReport;
pub use series::{DailySeries, Observation, SeriesLoader};
pub use state::{cold_start_epoch, ModelArtifact, ModelStateStore, StoredState};
pub use trainer::{IncrementalTrainer, TrainingOutcome};
pub use validate::{ValidationMetrics, Validator};

// re-exported so pipeline consumers rarely need the model crate directly
pub use moisture_model::{
    sliding_windows, FitOptions, NetworkShape, SequenceNet, TrainingWindow, WindowPredictor,
};

/// Version of the moisture_forecast library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the library
pub const NAME: &str = env!("CARGO_PKG_NAME");
