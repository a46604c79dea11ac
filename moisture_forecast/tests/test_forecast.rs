//! Integration tests for the autoregressive rollout.

use chrono::{Duration, NaiveDate};
use moisture_forecast::{
    DailySeries, ForecastEngine, ForecastError, NetworkShape, Observation, SequenceNet,
    WindowPredictor,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Stub that predicts one more than the newest value in its window. Makes
/// the feedback loop visible: without feedback every day would get the
/// same prediction.
struct LastPlusOne;

impl WindowPredictor for LastPlusOne {
    fn predict_next(&self, window: &[f64]) -> f64 {
        window.last().copied().unwrap_or(0.0) + 1.0
    }
}

fn series_of(values: &[f64]) -> DailySeries {
    let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let observations = values
        .iter()
        .enumerate()
        .map(|(i, &value)| Observation {
            date: start + Duration::days(i as i64),
            value,
        })
        .collect();
    DailySeries::from_observations(observations).unwrap()
}

#[test]
fn test_predictions_feed_back_into_the_buffer() {
    let series = series_of(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    let engine = ForecastEngine::new(7, 3);

    let forecast = engine.forecast(&LastPlusOne, &series).unwrap();

    let values: Vec<f64> = forecast.iter().map(|p| p.predicted).collect();
    assert_eq!(values, vec![9.0, 10.0, 11.0]);
}

#[test]
fn test_dates_continue_the_series_day_by_day() {
    let series = series_of(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]);
    let engine = ForecastEngine::new(7, 4);

    let forecast = engine.forecast(&LastPlusOne, &series).unwrap();

    let expected_start = series.last_date() + Duration::days(1);
    for (i, point) in forecast.iter().enumerate() {
        assert_eq!(point.date, expected_start + Duration::days(i as i64));
    }
}

#[test]
fn test_rollout_yields_exactly_horizon_points() {
    let series = series_of(&[0.3; 10]);
    for horizon in [1, 5, 30] {
        let engine = ForecastEngine::new(7, horizon);
        let rollout = engine.rollout(&LastPlusOne, &series).unwrap();
        assert_eq!(rollout.len(), horizon);
        assert_eq!(rollout.count(), horizon);
    }
}

#[test]
fn test_size_hint_shrinks_as_the_rollout_advances() {
    let series = series_of(&[0.3; 8]);
    let engine = ForecastEngine::new(7, 3);
    let mut rollout = engine.rollout(&LastPlusOne, &series).unwrap();

    assert_eq!(rollout.size_hint(), (3, Some(3)));
    rollout.next().unwrap();
    assert_eq!(rollout.size_hint(), (2, Some(2)));
    rollout.next().unwrap();
    rollout.next().unwrap();
    assert_eq!(rollout.size_hint(), (0, Some(0)));
    assert!(rollout.next().is_none());
}

#[test]
fn test_series_of_exactly_one_window_can_forecast() {
    let series = series_of(&[1.0, 2.0, 3.0]);
    let engine = ForecastEngine::new(3, 2);
    let forecast = engine.forecast(&LastPlusOne, &series).unwrap();
    assert_eq!(forecast.len(), 2);
    assert_eq!(forecast[0].predicted, 4.0);
}

#[test]
fn test_short_series_cannot_seed_the_buffer() {
    let series = series_of(&[1.0, 2.0, 3.0]);
    let engine = ForecastEngine::new(7, 5);
    let result = engine.forecast(&LastPlusOne, &series);
    assert!(matches!(result, Err(ForecastError::InsufficientData(_))));
}

#[test]
fn test_network_rollout_is_deterministic() {
    let shape = NetworkShape {
        hidden1: 6,
        hidden2: 4,
        dropout: 0.2,
    };
    let net = SequenceNet::cold_start(shape, &mut StdRng::seed_from_u64(5)).unwrap();
    let series = series_of(&[0.31, 0.30, 0.32, 0.29, 0.33, 0.31, 0.30, 0.32, 0.31, 0.30]);
    let engine = ForecastEngine::new(7, 10);

    let first = engine.forecast(&net, &series).unwrap();
    let second = engine.forecast(&net, &series).unwrap();

    assert_eq!(first, second);
    assert!(first.iter().all(|p| p.predicted.is_finite()));
}

#[test]
fn test_forecast_csv_has_ds_and_y_pred_columns() {
    let series = series_of(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    let engine = ForecastEngine::new(7, 3);
    let forecast = engine.forecast(&LastPlusOne, &series).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sm_forecast.csv");
    moisture_forecast::write_forecast_csv(&path, &forecast).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some("ds,y_pred"));
    assert_eq!(lines.next(), Some("2024-05-09,9.0"));
    assert_eq!(lines.clone().count(), 2);
}
