// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores ranker weights with Burn's CompactRecorder.
//
// Directory layout:
//   checkpoints/
//     model_epoch_1.mpk.gz   ← weights after epoch 1
//     model_epoch_2.mpk.gz
//     ...
//     latest_epoch.json      ← number of the newest epoch
//     train_config.json      ← hyperparameters + resolved vocab / embed sizes
//     metrics.csv            ← written by MetricsLogger
//
// The config is what lets `evaluate` and `rank` rebuild the exact
// architecture before loading weights into it.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::AttentionQaModel;

const LATEST_EPOCH_FILE: &str = "latest_epoch.json";
const CONFIG_FILE:       &str = "train_config.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory (and parents) if missing.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Opens an existing checkpoint directory without creating it.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        anyhow::ensure!(
            dir.is_dir(),
            "Checkpoint directory '{}' does not exist. Have you run 'train' first?",
            dir.display()
        );
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes {dir}/model_epoch_{epoch}.mpk.gz and moves the latest-epoch pointer.
    pub fn save_model<B: Backend>(&self, model: &AttentionQaModel<B>, epoch: usize) -> Result<()> {
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        fs::write(self.dir.join(LATEST_EPOCH_FILE), serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write {LATEST_EPOCH_FILE}"))?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Restores the newest weights into a model of matching architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  AttentionQaModel<B>,
        device: &B::Device,
    ) -> Result<AttentionQaModel<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?", path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' first.",
                path.display()
            )
        })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed training config '{}'", path.display()))
    }

    pub fn latest_epoch(&self) -> Result<usize> {
        let s = fs::read_to_string(self.dir.join(LATEST_EPOCH_FILE))
            .with_context(|| format!("Cannot find '{LATEST_EPOCH_FILE}'. Have you run 'train' first?"))?;

        Ok(serde_json::from_str::<usize>(s.trim())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::data::CorpusFormat;

    #[test]
    fn test_config_round_trips() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();

        let cfg = TrainConfig {
            vocab_size: 321,
            format:     CorpusFormat::InsuranceQa,
            ..TrainConfig::default()
        };
        ckpt.save_config(&cfg).unwrap();

        let loaded = ckpt.load_config().unwrap();
        assert_eq!(loaded.vocab_size, 321);
        assert_eq!(loaded.format, CorpusFormat::InsuranceQa);
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        assert!(ckpt.load_config().is_err());
        assert!(ckpt.latest_epoch().is_err());
    }

    #[test]
    fn test_open_requires_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CheckpointManager::open(dir.path().join("missing")).is_err());
        assert!(CheckpointManager::open(dir.path()).is_ok());
    }

    #[test]
    fn test_model_round_trips_latest_epoch() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();

        let config = crate::ml::model::AttentionQaConfig::new(6, 4, 3, 2);
        let model  = config.init::<NdArray>(&device);
        ckpt.save_model(&model, 1).unwrap();
        ckpt.save_model(&model, 2).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), 2);

        let before: Vec<f32> = model.embedding.weight.val().into_data().to_vec().unwrap();
        let fresh   = config.init::<NdArray>(&device);
        let loaded  = ckpt.load_model(fresh, &device).unwrap();
        let after: Vec<f32> = loaded.embedding.weight.val().into_data().to_vec().unwrap();
        assert_eq!(before, after);
    }
}
