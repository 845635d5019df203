// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// Files in the checkpoint directory:
//   model_epoch_{n}.mpk.gz   weights after epoch n
//   latest_epoch.json        number of the newest epoch saved
//   model_best.mpk.gz        weights of the epoch with the
//                            lowest validation loss
//   model_config.json        MemNetConfig (vocabulary size,
//                            embedding size, hops) needed to
//                            rebuild the model before loading
//   train_config.json        the full training run settings
//   tokenizer.json           the vocabulary (VocabStore)
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{MemNet, MemNetConfig};

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the directory if needed.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Save model weights for a given epoch and point latest_epoch.json at them.
    pub fn save_model<B: AutodiffBackend>(&self, model: &MemNet<B>, epoch: usize) -> Result<()> {
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Overwrite model_best with the weights of `epoch`.
    pub fn save_best_model<B: AutodiffBackend>(&self, model: &MemNet<B>, epoch: usize) -> Result<()> {
        let path = self.dir.join("model_best");

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save best model to '{}'", path.display()))?;

        tracing::debug!("Saved best model: epoch {}", epoch);
        Ok(())
    }

    /// Load the newest saved weights into `model`.
    /// The model must have been built from the saved MemNetConfig.
    pub fn load_model<B: Backend>(&self, model: MemNet<B>, device: &B::Device) -> Result<MemNet<B>> {
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

    pub fn save_model_config(&self, cfg: &MemNetConfig) -> Result<()> {
        let path = self.dir.join("model_config.json");
        cfg.save(&path)
            .with_context(|| format!("Cannot write model config to '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_model_config(&self) -> Result<MemNetConfig> {
        let path = self.dir.join("model_config.json");
        MemNetConfig::load(&path).map_err(|e| {
            anyhow::anyhow!(
                "Cannot read model config from '{}': {}. Make sure you have run 'train' first.",
                path.display(),
                e
            )
        })
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Read latest_epoch.json; fails if nothing was saved yet.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let s = fs::read_to_string(&path)
            .with_context(|| "Cannot find 'latest_epoch.json'. Have you run 'train' first?")?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type TrainBackend = Autodiff<NdArray>;

    fn manager() -> (tempfile::TempDir, CheckpointManager) {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path().to_string_lossy().to_string()).unwrap();
        (dir, mgr)
    }

    #[test]
    fn test_weights_round_trip() {
        let (_dir, mgr) = manager();
        let device = Default::default();
        let cfg = MemNetConfig::new(7).with_embedding_dim(3).with_hops(2);

        let model: MemNet<TrainBackend> = cfg.init(&device);
        mgr.save_model(&model, 4).unwrap();
        assert_eq!(mgr.latest_epoch().unwrap(), 4);

        let fresh: MemNet<NdArray> = cfg.init(&device);
        let loaded = mgr.load_model(fresh, &device).unwrap();

        let saved: Vec<f32>  = model.hop_map.val().into_data().convert::<f32>().to_vec().unwrap();
        let restored: Vec<f32> = loaded.hop_map.val().into_data().convert::<f32>().to_vec().unwrap();
        for (a, b) in saved.iter().zip(&restored) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_best_model_does_not_move_latest() {
        let (dir, mgr) = manager();
        let model: MemNet<TrainBackend> = MemNetConfig::new(5).with_embedding_dim(2).init(&Default::default());

        mgr.save_model(&model, 2).unwrap();
        mgr.save_best_model(&model, 1).unwrap();

        assert!(dir.path().join("model_best.mpk.gz").exists());
        assert_eq!(mgr.latest_epoch().unwrap(), 2);
    }

    #[test]
    fn test_model_config_round_trip() {
        let (_dir, mgr) = manager();
        mgr.save_model_config(&MemNetConfig::new(42).with_hops(2)).unwrap();
        let cfg = mgr.load_model_config().unwrap();
        assert_eq!(cfg.n_words, 42);
        assert_eq!(cfg.hops, 2);
        assert_eq!(cfg.embedding_dim, 100);
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let (_dir, mgr) = manager();
        assert!(mgr.latest_epoch().is_err());
        assert!(mgr.load_model_config().is_err());
    }
}
