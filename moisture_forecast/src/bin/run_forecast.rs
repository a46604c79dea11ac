//! Pipeline runner: train on the unseen tail, validate, write the forecast.
//!
//! Usage: `run_forecast [config.toml]`. Without an argument the production
//! defaults apply (files in the working directory).

use std::env;
use std::process;

use moisture_forecast::{pipeline, write_forecast_csv, PipelineConfig};
use tracing::info;

fn main() {
    tracing_subscriber::fmt::init();

    let config = match env::args().nth(1) {
        Some(path) => match PipelineConfig::from_toml_file(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("failed to load config {}: {}", path, err);
                process::exit(1);
            }
        },
        None => PipelineConfig::default(),
    };

    let report = match pipeline::run(&config) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("pipeline failed: {}", err);
            process::exit(1);
        }
    };

    if let Err(err) = write_forecast_csv(&config.forecast_path, &report.forecast) {
        eprintln!(
            "failed to write forecast {}: {}",
            config.forecast_path.display(),
            err
        );
        process::exit(1);
    }
    info!(
        rows = report.forecast.len(),
        path = %config.forecast_path.display(),
        "forecast written"
    );

    if report.trained {
        println!("Model trained through {}.", report.watermark);
    } else {
        println!("Nothing new to train; model watermark {}.", report.watermark);
    }
    match &report.metrics {
        Some(metrics) => println!("{}", metrics),
        None => println!("Validation skipped: no complete window to replay."),
    }
    println!("Forecast ({} days):", report.forecast.len());
    for point in report.forecast.iter().take(5) {
        println!("  {}  {:.4}", point.date, point.predicted);
    }
    if report.forecast.len() > 5 {
        println!(
            "  ... {} more rows in {}",
            report.forecast.len() - 5,
            config.forecast_path.display()
        );
    }
}
