//! Persistence of the trained model and its watermark.
//!
//! The artifact JSON embeds the watermark it was trained through, so the
//! two always advance as one record. The plain-text sidecar file is a
//! convenience copy for humans and external tooling; when it is missing or
//! corrupt the embedded value wins.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use moisture_model::SequenceNet;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ForecastError, Result};

const WATERMARK_FORMAT: &str = "%Y-%m-%d";

/// Watermark value before any training has ever happened. Every real
/// observation sorts after it, so a cold start trains on the whole series.
pub fn cold_start_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap()
}

/// A trained network together with the window size it was trained for and
/// the date of the newest observation it has seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub network: SequenceNet,
    pub window_size: usize,
    pub watermark: NaiveDate,
}

/// What a load found on disk.
#[derive(Debug)]
pub struct StoredState {
    /// The persisted artifact, if any
    pub artifact: Option<ModelArtifact>,
    /// Effective watermark: from the artifact when present, otherwise from
    /// the sidecar, otherwise the cold-start epoch
    pub watermark: NaiveDate,
}

/// Reads and commits the artifact + watermark pair.
///
/// Writes go through a temp file and an atomic rename, so a crash leaves
/// either the previous state or the new one, never a half-written file.
/// Only one process may write through a given pair of paths at a time;
/// concurrent pipeline runs over the same files are unsupported.
#[derive(Debug, Clone)]
pub struct ModelStateStore {
    artifact_path: PathBuf,
    watermark_path: PathBuf,
}

impl ModelStateStore {
    pub fn new(artifact_path: impl Into<PathBuf>, watermark_path: impl Into<PathBuf>) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            watermark_path: watermark_path.into(),
        }
    }

    /// Load whatever state exists.
    ///
    /// A missing artifact or sidecar is a normal cold start. An unreadable
    /// sidecar is recovered from locally (artifact value or epoch) with a
    /// warning. An unreadable artifact is a hard [`ForecastError::ModelLoad`]
    /// error: silently retraining from scratch would discard the history the
    /// watermark claims was seen.
    pub fn load(&self) -> Result<StoredState> {
        let artifact = self.read_artifact()?;
        let sidecar = match self.read_watermark() {
            Ok(found) => found,
            Err(err) => {
                match &artifact {
                    Some(a) => warn!(
                        error = %err,
                        watermark = %a.watermark,
                        "watermark sidecar unreadable; using the artifact's embedded value"
                    ),
                    None => warn!(
                        error = %err,
                        "watermark sidecar unreadable and no artifact; falling back to cold-start epoch"
                    ),
                }
                None
            }
        };
        let watermark = match (&artifact, sidecar) {
            (Some(artifact), _) => artifact.watermark,
            (None, Some(date)) => date,
            (None, None) => cold_start_epoch(),
        };
        if artifact.is_none() {
            info!(watermark = %watermark, "no model artifact on disk; starting cold");
        }
        Ok(StoredState {
            artifact,
            watermark,
        })
    }

    /// Commit the artifact and refresh the sidecar. The artifact is the
    /// authoritative record and is written first.
    pub fn save(&self, artifact: &ModelArtifact) -> Result<()> {
        let json = serde_json::to_string(artifact)?;
        write_atomic(&self.artifact_path, &json)?;
        let sidecar = format!("{}\n", artifact.watermark.format(WATERMARK_FORMAT));
        write_atomic(&self.watermark_path, &sidecar)?;
        info!(
            watermark = %artifact.watermark,
            path = %self.artifact_path.display(),
            "model state committed"
        );
        Ok(())
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    pub fn watermark_path(&self) -> &Path {
        &self.watermark_path
    }

    fn read_artifact(&self) -> Result<Option<ModelArtifact>> {
        if !self.artifact_path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.artifact_path).map_err(|e| {
            ForecastError::ModelLoad(format!("{}: {}", self.artifact_path.display(), e))
        })?;
        let artifact = serde_json::from_str(&raw).map_err(|e| {
            ForecastError::ModelLoad(format!("{}: {}", self.artifact_path.display(), e))
        })?;
        Ok(Some(artifact))
    }

    fn read_watermark(&self) -> Result<Option<NaiveDate>> {
        if !self.watermark_path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.watermark_path)?;
        let date = NaiveDate::parse_from_str(raw.trim(), WATERMARK_FORMAT).map_err(|e| {
            ForecastError::CorruptWatermark(format!(
                "{}: {:?}: {}",
                self.watermark_path.display(),
                raw.trim(),
                e
            ))
        })?;
        Ok(Some(date))
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use moisture_model::NetworkShape;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn small_artifact(watermark: NaiveDate) -> ModelArtifact {
        let shape = NetworkShape {
            hidden1: 4,
            hidden2: 3,
            dropout: 0.2,
        };
        ModelArtifact {
            network: SequenceNet::cold_start(shape, &mut StdRng::seed_from_u64(1)).unwrap(),
            window_size: 7,
            watermark,
        }
    }

    fn store_in(dir: &TempDir) -> ModelStateStore {
        ModelStateStore::new(
            dir.path().join("sm_model.json"),
            dir.path().join("last_trained_date.txt"),
        )
    }

    #[test]
    fn test_cold_start_when_nothing_on_disk() {
        let dir = TempDir::new().unwrap();
        let state = store_in(&dir).load().unwrap();
        assert!(state.artifact.is_none());
        assert_eq!(state.watermark, cold_start_epoch());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let watermark = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let artifact = small_artifact(watermark);

        store.save(&artifact).unwrap();
        let state = store.load().unwrap();

        assert_eq!(state.artifact.as_ref(), Some(&artifact));
        assert_eq!(state.watermark, watermark);
        // sidecar holds the same date as plain text
        let raw = fs::read_to_string(store.watermark_path()).unwrap();
        assert_eq!(raw.trim(), "2024-06-30");
        // no temp files left behind
        assert!(!dir.path().join("sm_model.tmp").exists());
        assert!(!dir.path().join("last_trained_date.tmp").exists());
    }

    #[test]
    fn test_restored_network_predicts_identically() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let artifact = small_artifact(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        store.save(&artifact).unwrap();

        let restored = store.load().unwrap().artifact.unwrap();
        let window = [0.31, 0.30, 0.33, 0.29, 0.32, 0.31, 0.30];
        assert_eq!(
            artifact.network.predict(&window),
            restored.network.predict(&window)
        );
    }

    #[test]
    fn test_corrupt_sidecar_recovers_from_artifact() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let watermark = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        store.save(&small_artifact(watermark)).unwrap();
        fs::write(store.watermark_path(), "not a date").unwrap();

        let state = store.load().unwrap();
        assert_eq!(state.watermark, watermark);
    }

    #[test]
    fn test_corrupt_sidecar_without_artifact_falls_back_to_epoch() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.watermark_path(), "06/30/2024").unwrap();

        let state = store.load().unwrap();
        assert!(state.artifact.is_none());
        assert_eq!(state.watermark, cold_start_epoch());
    }

    #[test]
    fn test_sidecar_alone_sets_watermark() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.watermark_path(), "2024-02-29\n").unwrap();

        let state = store.load().unwrap();
        assert!(state.artifact.is_none());
        assert_eq!(
            state.watermark,
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_garbage_artifact_is_a_hard_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.artifact_path(), "{ not json").unwrap();

        let result = store.load();
        assert!(matches!(result, Err(ForecastError::ModelLoad(_))));
    }

    #[test]
    fn test_save_overwrites_previous_state() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .save(&small_artifact(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
            .unwrap();
        let second = small_artifact(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        store.save(&second).unwrap();

        let state = store.load().unwrap();
        assert_eq!(state.watermark, second.watermark);
        assert_eq!(state.artifact, Some(second));
    }
}
