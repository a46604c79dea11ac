//! Autoregressive rollout past the end of the observed series.

use std::collections::VecDeque;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use moisture_model::WindowPredictor;
use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::series::DailySeries;

/// One forecast value beyond the observed series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    /// Forecast date
    #[serde(rename = "ds")]
    pub date: NaiveDate,
    /// Predicted value
    #[serde(rename = "y_pred")]
    pub predicted: f64,
}

/// Rolls a predictor forward day by day. Each prediction is pushed into
/// the input buffer and the oldest value dropped, so later days are
/// predicted from earlier predictions.
#[derive(Debug, Clone, Copy)]
pub struct ForecastEngine {
    window_size: usize,
    horizon: usize,
}

impl ForecastEngine {
    pub fn new(window_size: usize, horizon: usize) -> Self {
        Self {
            window_size,
            horizon,
        }
    }

    /// Start a lazy rollout seeded with the last `window_size` observed
    /// values. Fails with [`ForecastError::InsufficientData`] when the
    /// series cannot fill the buffer; a series of exactly `window_size`
    /// observations is enough.
    pub fn rollout<'a, P: WindowPredictor>(
        &self,
        predictor: &'a P,
        series: &DailySeries,
    ) -> Result<Rollout<'a, P>> {
        let values = series.values();
        if values.len() < self.window_size {
            return Err(ForecastError::InsufficientData(format!(
                "forecasting needs at least {} observations to seed the buffer, found {}",
                self.window_size,
                values.len()
            )));
        }
        let buffer: VecDeque<f64> = values[values.len() - self.window_size..]
            .iter()
            .copied()
            .collect();
        Ok(Rollout {
            predictor,
            buffer,
            last_date: series.last_date(),
            horizon: self.horizon,
            step: 0,
        })
    }

    /// Eager variant of [`ForecastEngine::rollout`].
    pub fn forecast<P: WindowPredictor>(
        &self,
        predictor: &P,
        series: &DailySeries,
    ) -> Result<Vec<ForecastPoint>> {
        Ok(self.rollout(predictor, series)?.collect())
    }
}

/// Lazy, finite forecast sequence. Yields exactly `horizon` points with
/// consecutive dates starting the day after the last observation.
#[derive(Debug)]
pub struct Rollout<'a, P> {
    predictor: &'a P,
    buffer: VecDeque<f64>,
    last_date: NaiveDate,
    horizon: usize,
    step: usize,
}

impl<P: WindowPredictor> Iterator for Rollout<'_, P> {
    type Item = ForecastPoint;

    fn next(&mut self) -> Option<ForecastPoint> {
        if self.step == self.horizon {
            return None;
        }
        let window: Vec<f64> = self.buffer.iter().copied().collect();
        let predicted = self.predictor.predict_next(&window);
        self.buffer.pop_front();
        self.buffer.push_back(predicted);
        self.step += 1;
        Some(ForecastPoint {
            date: self.last_date + Duration::days(self.step as i64),
            predicted,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.horizon - self.step;
        (remaining, Some(remaining))
    }
}

impl<P: WindowPredictor> ExactSizeIterator for Rollout<'_, P> {}

/// Write forecast points as the downstream `ds,y_pred` CSV.
pub fn write_forecast_csv<P: AsRef<Path>>(path: P, points: &[ForecastPoint]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for point in points {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}
