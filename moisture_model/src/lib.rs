//! # Moisture Model
//!
//! Core math for soil-moisture sequence regression: sliding-window framing,
//! a small stacked recurrent network, and gradient-based training.
//!
//! The crate is deliberately free of any file or pipeline concerns. It
//! operates on plain `f64` slices so the surrounding pipeline crate can feed
//! it from whatever storage it likes.
//!
//! ## Features
//!
//! - **Windowing**: turn a series into supervised (input, label) pairs
//! - **Network**: two stacked tanh recurrent layers, dropout, scalar head
//! - **Training**: backpropagation through time with the Adam optimizer
//! - **Determinism**: identical seeds produce identical weights and masks

pub mod matrix;
pub mod network;
pub mod training;
pub mod window;

pub use matrix::Matrix;
pub use network::{NetworkShape, SequenceNet, WindowPredictor};
pub use training::{fit, FitOptions, FitSummary};
pub use window::{sliding_windows, TrainingWindow};

use thiserror::Error;

/// Errors that can occur during model construction or training
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Not enough data points for the requested operation
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A hyperparameter or input shape is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, ModelError>;
