//! Error types for the moisture_forecast crate

use thiserror::Error;

/// Errors raised while loading data, training, or forecasting
#[derive(Error, Debug)]
pub enum ForecastError {
    /// Input series file is missing or holds no observations
    #[error("Missing input series: {0}")]
    MissingInput(String),

    /// Not enough observations for the requested operation
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Watermark sidecar exists but does not hold an ISO date
    #[error("Corrupt watermark: {0}")]
    CorruptWatermark(String),

    /// Persisted model artifact is unreadable or incompatible
    #[error("Cannot load model: {0}")]
    ModelLoad(String),

    /// Observation series violates ordering or uniqueness rules
    #[error("Invalid series data: {0}")]
    Data(String),

    /// Configuration file is malformed or holds out-of-range values
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Error from the underlying sequence model
    #[error("Model error: {0}")]
    Model(#[from] moisture_model::ModelError),

    /// IO error reading or writing pipeline files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for forecast operations
pub type Result<T> = std::result::Result<T, ForecastError>;
