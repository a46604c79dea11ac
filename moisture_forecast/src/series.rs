//! Daily observation series: CSV loading, ordering, and summary stats.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// A single dated soil-moisture estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Observation date
    pub date: NaiveDate,
    /// Soil-moisture estimate
    pub value: f64,
}

/// Row shape of the upstream export: an ISO date column `ds` and a value
/// column `y`.
#[derive(Debug, Deserialize)]
struct SeriesRow {
    ds: NaiveDate,
    y: f64,
}

/// Loads the persisted series from disk.
pub struct SeriesLoader;

impl SeriesLoader {
    /// Read a `ds,y` CSV into a validated series.
    ///
    /// A missing file or a file with no data rows is a hard
    /// [`ForecastError::MissingInput`]: the pipeline must halt before it
    /// touches any model state.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<DailySeries> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ForecastError::MissingInput(format!(
                "{} not found",
                path.display()
            )));
        }
        let mut reader = csv::Reader::from_path(path)?;
        let mut observations = Vec::new();
        for row in reader.deserialize() {
            let row: SeriesRow = row?;
            observations.push(Observation {
                date: row.ds,
                value: row.y,
            });
        }
        if observations.is_empty() {
            return Err(ForecastError::MissingInput(format!(
                "{} holds no observations",
                path.display()
            )));
        }
        DailySeries::from_observations(observations)
    }
}

/// A non-empty series of observations, sorted by date with no duplicates.
///
/// Construction enforces the invariants, so every consumer can rely on
/// chronological order and on `last_date` existing.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    observations: Vec<Observation>,
}

impl DailySeries {
    /// Build a series from raw observations. Input is sorted by date;
    /// duplicate dates and empty input are rejected.
    pub fn from_observations(mut observations: Vec<Observation>) -> Result<Self> {
        if observations.is_empty() {
            return Err(ForecastError::MissingInput(
                "empty observation set".to_string(),
            ));
        }
        observations.sort_by_key(|o| o.date);
        for pair in observations.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(ForecastError::Data(format!(
                    "duplicate observation date {}",
                    pair[0].date
                )));
            }
        }
        Ok(Self { observations })
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Values in chronological order.
    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    /// Date of the newest observation.
    pub fn last_date(&self) -> NaiveDate {
        self.observations[self.observations.len() - 1].date
    }

    /// Index of the first observation strictly after `date`, or `None`
    /// when every observation is on or before it.
    pub fn first_index_after(&self, date: NaiveDate) -> Option<usize> {
        let index = self.observations.partition_point(|o| o.date <= date);
        if index < self.observations.len() {
            Some(index)
        } else {
            None
        }
    }

    /// Arithmetic mean of the values.
    pub fn mean(&self) -> f64 {
        let sum: f64 = self.observations.iter().map(|o| o.value).sum();
        sum / self.observations.len() as f64
    }

    /// Population standard deviation of the values.
    pub fn std_dev(&self) -> f64 {
        let mean = self.mean();
        let variance: f64 = self
            .observations
            .iter()
            .map(|o| {
                let d = o.value - mean;
                d * d
            })
            .sum::<f64>()
            / self.observations.len() as f64;
        variance.sqrt()
    }
}
