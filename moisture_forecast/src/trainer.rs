//! Incremental training driven by the stored watermark.

use moisture_model::{fit, sliding_windows, FitOptions, NetworkShape, SequenceNet};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{ForecastError, Result};
use crate::series::DailySeries;
use crate::state::{ModelArtifact, ModelStateStore};

/// Result of one incremental training run.
#[derive(Debug)]
pub struct TrainingOutcome {
    /// The artifact after the run. On a no-op run this is whatever was
    /// loaded (or a cold-started network that was never persisted).
    pub artifact: ModelArtifact,
    /// Whether a training pass actually ran and was committed
    pub trained: bool,
    /// Windows the pass trained on (zero on a no-op)
    pub windows_trained: usize,
    /// Mean squared error over the last epoch, when training ran
    pub final_loss: Option<f64>,
}

/// Trains the model on observations newer than the stored watermark.
///
/// Each unseen observation contributes exactly one training window: the
/// slice handed to the windower starts `window_size` values before the
/// first unseen index, so the windows that *end* in unseen territory are
/// trained and nothing older is revisited.
#[derive(Debug, Clone)]
pub struct IncrementalTrainer {
    window_size: usize,
    shape: NetworkShape,
    options: FitOptions,
    seed: u64,
}

impl IncrementalTrainer {
    pub fn new(
        window_size: usize,
        shape: NetworkShape,
        options: FitOptions,
        seed: u64,
    ) -> Result<Self> {
        if window_size == 0 {
            return Err(ForecastError::Config(
                "window_size must be at least 1".to_string(),
            ));
        }
        shape.validate()?;
        options.validate()?;
        Ok(Self {
            window_size,
            shape,
            options,
            seed,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(
            config.window_size,
            config.network_shape(),
            config.fit_options(),
            config.seed,
        )
    }

    /// Run one training pass: load state, train on the unseen tail, commit.
    ///
    /// Two situations make the run a no-op that leaves the files untouched:
    /// no observation is newer than the watermark, or the series is too
    /// short to produce a single window. Re-running on unchanged input is
    /// therefore byte-identical on disk.
    pub fn run(&self, series: &DailySeries, store: &ModelStateStore) -> Result<TrainingOutcome> {
        let state = store.load()?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut artifact = match state.artifact {
            Some(artifact) => {
                if artifact.window_size != self.window_size {
                    return Err(ForecastError::ModelLoad(format!(
                        "artifact was trained with window size {}, configured {}",
                        artifact.window_size, self.window_size
                    )));
                }
                artifact
            }
            None => ModelArtifact {
                network: SequenceNet::cold_start(self.shape, &mut rng)?,
                window_size: self.window_size,
                watermark: state.watermark,
            },
        };

        let Some(first_unseen) = series.first_index_after(state.watermark) else {
            info!(
                watermark = %state.watermark,
                "no observations beyond watermark; skipping training"
            );
            return Ok(TrainingOutcome {
                artifact,
                trained: false,
                windows_trained: 0,
                final_loss: None,
            });
        };

        if series.len() <= self.window_size {
            info!(
                observations = series.len(),
                window_size = self.window_size,
                "series too short for a training window; skipping training"
            );
            return Ok(TrainingOutcome {
                artifact,
                trained: false,
                windows_trained: 0,
                final_loss: None,
            });
        }

        let start = first_unseen.saturating_sub(self.window_size);
        let values = series.values();
        let windows = sliding_windows(&values[start..], self.window_size);
        info!(
            unseen = series.len() - first_unseen,
            windows = windows.len(),
            epochs = self.options.epochs,
            "training on unseen tail"
        );

        let summary = fit(&mut artifact.network, &windows, self.options, &mut rng)?;
        artifact.watermark = series.last_date();
        store.save(&artifact)?;
        info!(
            watermark = %artifact.watermark,
            final_loss = summary.final_loss,
            "training pass committed"
        );

        Ok(TrainingOutcome {
            artifact,
            trained: true,
            windows_trained: windows.len(),
            final_loss: Some(summary.final_loss),
        })
    }
}
