// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load train (and test) stories   (Layer 4 - data)
//   Step 2: Build the vocabulary            (Layer 6 - infra)
//   Step 3: Encode questions into samples   (Layer 4 - data)
//   Step 4: Hold out a validation split     (Layer 4 - data)
//   Step 5: Save configs                    (Layer 6 - infra)
//   Step 6: Run training loop               (Layer 5 - ml)
//
// The test file defaults to the train file with "train"
// replaced by "test", so `qa1_single-supporting-fact_train.txt`
// is evaluated against `qa1_single-supporting-fact_test.txt`.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{
    dataset::MemDataset,
    loader::BabiLoader,
    sampler::SampleBuilder,
    splitter::split_train_val,
};
use crate::domain::{story::Story, traits::StorySource};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    vocab_store::VocabStore,
};
use crate::ml::{
    backend::BackendKind,
    model::MemNetConfig,
    schedule::LrSchedule,
    trainer::{run_training, OptimizerKind, TrainReport, TrainingData},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings of a training run. Saved next to the checkpoints
// so evaluation and inference encode data the same way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub train_file:     String,
    /// None when no test file exists
    pub test_file:      Option<String>,
    pub checkpoint_dir: String,
    pub epochs:         usize,
    pub batch_size:     usize,
    pub lr:             f64,
    pub lr_schedule:    LrSchedule,
    pub optimizer:      OptimizerKind,
    /// Maximum gradient L2 norm, None disables clipping
    pub clip_norm:      Option<f64>,
    pub embedding_dim:  usize,
    pub hops:           usize,
    /// Most recent facts kept in memory, 0 keeps all
    pub memory_size:    usize,
    /// Fraction of training questions held out for validation
    pub valid_fraction: f64,
    /// Score train and test sets every N epochs, 0 only at the end
    pub eval_every:     usize,
    pub seed:           u64,
    pub backend:        BackendKind,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_file:     String::new(),
            test_file:      None,
            checkpoint_dir: "checkpoints".to_string(),
            epochs:         10,
            batch_size:     1,
            lr:             0.01,
            lr_schedule:    LrSchedule::default(),
            optimizer:      OptimizerKind::AdaGrad,
            clip_norm:      None,
            embedding_dim:  100,
            hops:           3,
            memory_size:    0,
            valid_fraction: 0.0,
            eval_every:     5,
            seed:           42,
            backend:        BackendKind::Ndarray,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            bail!("epochs must be at least 1");
        }
        if self.batch_size == 0 {
            bail!("batch size must be at least 1");
        }
        if self.hops == 0 {
            bail!("hops must be at least 1");
        }
        if self.embedding_dim == 0 {
            bail!("embedding dimension must be at least 1");
        }
        if !(self.lr > 0.0) {
            bail!("learning rate must be positive, got {}", self.lr);
        }
        if !(0.0..1.0).contains(&self.valid_fraction) {
            bail!("validation fraction must be in [0, 1), got {}", self.valid_fraction);
        }
        if matches!(self.clip_norm, Some(c) if !(c > 0.0)) {
            bail!("clip norm must be positive");
        }
        Ok(())
    }

    pub fn model_config(&self, n_words: usize) -> MemNetConfig {
        MemNetConfig::new(n_words)
            .with_embedding_dim(self.embedding_dim)
            .with_hops(self.hops)
    }
}

/// Test file name for a train file: every "train" becomes "test".
/// None when the name contains no "train".
pub fn derive_test_path(train_file: &str) -> Option<String> {
    train_file
        .contains("train")
        .then(|| train_file.replace("train", "test"))
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainReport> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Load stories ──────────────────────────────────────────────
        let train_stories = BabiLoader::new(&cfg.train_file).load_all()?;
        let test_stories: Option<Vec<Story>> = match &cfg.test_file {
            Some(path) if Path::new(path).exists() => Some(BabiLoader::new(path).load_all()?),
            Some(path) => {
                tracing::warn!("Test file '{}' not found, skipping test evaluation", path);
                None
            }
            None => None,
        };

        // ── Step 2: Build vocabulary from the training stories only ───────────
        let sampler = SampleBuilder::new(cfg.memory_size);
        let words   = sampler.corpus_words(&train_stories);
        let vocab   = VocabStore::new(&cfg.checkpoint_dir)
            .build_and_save(words.iter().map(String::as_str))?;

        // ── Step 3: Encode samples ────────────────────────────────────────────
        let train_samples = sampler.build(&train_stories, &vocab)?;
        let test_dataset = test_stories
            .map(|stories| sampler.build(&stories, &vocab).map(MemDataset::new))
            .transpose()?;
        tracing::info!("Built {} training samples", train_samples.len());

        // ── Step 4: Validation split ──────────────────────────────────────────
        let (train_samples, valid_samples) =
            split_train_val(train_samples, 1.0 - cfg.valid_fraction, cfg.seed);
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            valid_samples.len()
        );

        // ── Step 5: Save configs for inference ────────────────────────────────
        let model_cfg = cfg.model_config(vocab.len());
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt.save_config(cfg)?;
        ckpt.save_model_config(&model_cfg)?;
        let metrics = MetricsLogger::new(ckpt.dir())?;

        // ── Step 6: Run training loop (Layer 5) ───────────────────────────────
        let data = TrainingData {
            train: MemDataset::new(train_samples),
            valid: MemDataset::new(valid_samples),
            test:  test_dataset,
        };
        run_training(cfg, &model_cfg, data, &ckpt, &metrics)
    }
}
