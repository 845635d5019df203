// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a trained checkpoint on a bAbI file:
//
//   Step 1: Load vocabulary, configs and weights  (Layer 6)
//   Step 2: Load and encode the stories           (Layer 4)
//   Step 3: Count correct / wrong answers         (Layer 5)

use anyhow::{bail, Result};

use crate::data::{dataset::MemDataset, loader::BabiLoader, sampler::SampleBuilder};
use crate::domain::traits::StorySource;
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabStore};
use crate::ml::{
    backend::CpuBackend,
    evaluator::{evaluate, EvalReport},
    model::MemNet,
};

pub struct EvaluateUseCase {
    checkpoint_dir: String,
}

impl EvaluateUseCase {
    pub fn new(checkpoint_dir: impl Into<String>) -> Self {
        Self { checkpoint_dir: checkpoint_dir.into() }
    }

    pub fn execute(&self, story_file: &str) -> Result<EvalReport> {
        // ── Step 1: Restore the trained model ─────────────────────────────────
        let ckpt      = CheckpointManager::new(&self.checkpoint_dir)?;
        let train_cfg = ckpt.load_config()?;
        let model_cfg = ckpt.load_model_config()?;
        let vocab     = VocabStore::new(&self.checkpoint_dir).load()?;

        if model_cfg.n_words != vocab.len() {
            bail!(
                "Vocabulary has {} words but the model was trained with {}",
                vocab.len(),
                model_cfg.n_words
            );
        }

        let device = Default::default();
        let model: MemNet<CpuBackend> = ckpt.load_model(model_cfg.init(&device), &device)?;

        // ── Step 2: Encode with the training-time memory window ───────────────
        let stories = BabiLoader::new(story_file).load_all()?;
        let samples = SampleBuilder::new(train_cfg.memory_size).build(&stories, &vocab)?;
        tracing::info!("Evaluating {} questions from '{}'", samples.len(), story_file);

        // ── Step 3: Score ─────────────────────────────────────────────────────
        Ok(evaluate(&model, MemDataset::new(samples), train_cfg.batch_size.max(32), &device))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{TrainConfig, TrainUseCase};
    use crate::ml::model::MemNetConfig;

    const STORIES: &str = "1 Mary moved to the bathroom.\n\
                           2 Where is Mary? \tbathroom\t1\n\
                           1 John went to the hallway.\n\
                           2 Where is John? \thallway\t1\n";

    #[test]
    fn test_scores_every_question() {
        let dir  = tempfile::tempdir().unwrap();
        let file = dir.path().join("tiny_train.txt");
        std::fs::write(&file, STORIES).unwrap();
        let ckpt_dir = dir.path().join("ckpt").to_string_lossy().to_string();

        TrainUseCase::new(TrainConfig {
            train_file:     file.to_string_lossy().to_string(),
            checkpoint_dir: ckpt_dir.clone(),
            epochs:         1,
            embedding_dim:  8,
            ..TrainConfig::default()
        })
        .execute()
        .unwrap();

        let report = EvaluateUseCase::new(ckpt_dir)
            .execute(&file.to_string_lossy())
            .unwrap();
        assert_eq!(report.total(), 2);
    }

    #[test]
    fn test_vocabulary_size_mismatch_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let file = dir.path().join("tiny_train.txt");
        std::fs::write(&file, STORIES).unwrap();
        let ckpt_dir = dir.path().join("ckpt").to_string_lossy().to_string();

        TrainUseCase::new(TrainConfig {
            train_file:     file.to_string_lossy().to_string(),
            checkpoint_dir: ckpt_dir.clone(),
            epochs:         1,
            embedding_dim:  8,
            ..TrainConfig::default()
        })
        .execute()
        .unwrap();

        // A model config from some other vocabulary
        CheckpointManager::new(ckpt_dir.clone())
            .unwrap()
            .save_model_config(&MemNetConfig::new(3).with_embedding_dim(8))
            .unwrap();

        let err = EvaluateUseCase::new(ckpt_dir)
            .execute(&file.to_string_lossy())
            .unwrap_err();
        assert!(err.to_string().contains("Vocabulary has"), "{err}");
    }

    #[test]
    fn test_without_checkpoint_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let use_case = EvaluateUseCase::new(dir.path().to_string_lossy().to_string());
        assert!(use_case.execute("whatever_test.txt").is_err());
    }
}
