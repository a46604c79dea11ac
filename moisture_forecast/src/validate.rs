//! One-step-ahead replay over the historical series.

use std::fmt;

use moisture_model::WindowPredictor;
use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::series::DailySeries;

/// Forecast error metrics over the replayed windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidationMetrics {
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Number of one-step predictions scored
    pub windows: usize,
}

impl fmt::Display for ValidationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation over {} windows:", self.windows)?;
        writeln!(f, "  RMSE: {:.6}", self.rmse)?;
        write!(f, "  MAE:  {:.6}", self.mae)
    }
}

/// Replays a predictor over every historical window.
///
/// The replay is in-sample: the model may have been trained on the very
/// windows it is scored on, so the numbers measure fit, not out-of-sample
/// accuracy. Treat them as a sanity check, not a generalization estimate.
#[derive(Debug, Clone)]
pub struct Validator {
    window_size: usize,
}

impl Validator {
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    /// Score one-step predictions at every index from `window_size` to the
    /// end of the series.
    ///
    /// Returns [`ForecastError::InsufficientData`] when the series has no
    /// complete window to replay, so callers can distinguish "nothing to
    /// validate" from a zero-error fit.
    pub fn evaluate<P: WindowPredictor>(
        &self,
        predictor: &P,
        series: &DailySeries,
    ) -> Result<ValidationMetrics> {
        let values = series.values();
        if self.window_size == 0 || values.len() <= self.window_size {
            return Err(ForecastError::InsufficientData(format!(
                "validation needs more than {} observations, found {}",
                self.window_size,
                values.len()
            )));
        }

        let mut squared_sum = 0.0;
        let mut absolute_sum = 0.0;
        for i in self.window_size..values.len() {
            let predicted = predictor.predict_next(&values[i - self.window_size..i]);
            let err = values[i] - predicted;
            squared_sum += err * err;
            absolute_sum += err.abs();
        }
        let count = (values.len() - self.window_size) as f64;
        Ok(ValidationMetrics {
            rmse: (squared_sum / count).sqrt(),
            mae: absolute_sum / count,
            windows: values.len() - self.window_size,
        })
    }
}
