//! Two pipeline runs over a synthetic series: a cold start that trains on
//! everything, then a re-run with nothing new to show the watermark no-op.
//!
//! Run with: `cargo run --example incremental_run`

use std::fmt::Write as _;
use std::fs;

use chrono::NaiveDate;
use moisture_forecast::{pipeline, PipelineConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let dir = tempfile::tempdir()?;
    let series_path = dir.path().join("sm_series.csv");

    // 60 days of a damped seasonal moisture curve
    let start = NaiveDate::from_ymd_opt(2024, 4, 1).ok_or("bad date")?;
    let mut csv = String::from("ds,y\n");
    for day in 0..60 {
        let date = start + chrono::Duration::days(day);
        let value = 0.32 + 0.05 * (day as f64 / 9.0).sin() + 0.01 * (day as f64 / 3.0).cos();
        writeln!(csv, "{},{:.4}", date, value)?;
    }
    fs::write(&series_path, csv)?;

    let config = PipelineConfig {
        series_path,
        model_path: dir.path().join("sm_model.json"),
        watermark_path: dir.path().join("last_trained_date.txt"),
        forecast_path: dir.path().join("sm_forecast.csv"),
        epochs: 30,
        forecast_days: 14,
        ..PipelineConfig::default()
    };

    println!("=== First run (cold start) ===");
    let report = pipeline::run(&config)?;
    println!("trained: {}", report.trained);
    println!("watermark: {}", report.watermark);
    if let Some(metrics) = &report.metrics {
        println!("{}", metrics);
    }
    println!("first forecast days:");
    for point in report.forecast.iter().take(5) {
        println!("  {}  {:.4}", point.date, point.predicted);
    }

    println!();
    println!("=== Second run (no new observations) ===");
    let rerun = pipeline::run(&config)?;
    println!("trained: {}", rerun.trained);
    println!("watermark unchanged: {}", rerun.watermark == report.watermark);
    println!(
        "forecast identical: {}",
        rerun.forecast == report.forecast
    );

    Ok(())
}
