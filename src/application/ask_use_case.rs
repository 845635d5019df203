// ============================================================
// Layer 2 — Ask Use Case
// ============================================================
// Answers a free-form question about a short story:
//
//   Step 1: Load vocabulary and checkpoint      (Layer 6)
//   Step 2: Read the facts, one per line        (Layer 4)
//   Step 3: Run the memory network              (Layer 5)
//
// Only the trained vocabulary is understood; unknown words
// still enter memory, as [UNK].

use anyhow::{Context, Result};
use std::fs;

use crate::data::loader::parse_facts;
use crate::domain::traits::{Answer, QuestionAnswerer};
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabStore};
use crate::ml::inferencer::Inferencer;

pub struct AskUseCase {
    inferencer: Inferencer,
}

impl AskUseCase {
    pub fn new(checkpoint_dir: &str) -> Result<Self> {
        let vocab = VocabStore::new(checkpoint_dir).load()?;
        let ckpt  = CheckpointManager::new(checkpoint_dir)?;
        let memory_size = ckpt.load_config()?.memory_size;
        let inferencer  = Inferencer::from_checkpoint(&ckpt, vocab, memory_size)?;
        Ok(Self { inferencer })
    }

    /// Read facts from `story_file` and answer `question` about them.
    /// Returns the facts alongside the answer so callers can show
    /// the attention next to each fact.
    pub fn answer_file(&self, story_file: &str, question: &str) -> Result<(Vec<String>, Answer)> {
        let content = fs::read_to_string(story_file)
            .with_context(|| format!("Cannot read story '{story_file}'"))?;
        let facts = parse_facts(&content);
        if facts.is_empty() {
            tracing::warn!("Story '{}' has no facts", story_file);
        }

        let answer = self.inferencer.answer(&facts, question)?;
        tracing::info!("Answer: '{}' (p={:.4})", answer.word, answer.confidence);
        Ok((facts, answer))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{TrainConfig, TrainUseCase};

    #[test]
    fn test_answers_from_story_file() {
        let dir   = tempfile::tempdir().unwrap();
        let train = dir.path().join("qa_train.txt");
        std::fs::write(
            &train,
            "1 Mary moved to the bathroom.\n2 Where is Mary? \tbathroom\t1\n",
        )
        .unwrap();
        let ckpt_dir = dir.path().join("ckpt").to_string_lossy().to_string();

        TrainUseCase::new(TrainConfig {
            train_file:     train.to_string_lossy().to_string(),
            checkpoint_dir: ckpt_dir.clone(),
            epochs:         1,
            embedding_dim:  4,
            ..TrainConfig::default()
        })
        .execute()
        .unwrap();

        let story = dir.path().join("story.txt");
        std::fs::write(&story, "1 Mary moved to the bathroom.\n2 Mary went to the moon.\n").unwrap();

        let use_case = AskUseCase::new(&ckpt_dir).unwrap();
        let (facts, answer) = use_case
            .answer_file(&story.to_string_lossy(), "Where is Mary?")
            .unwrap();

        assert_eq!(facts.len(), 2);
        assert_eq!(answer.attention.len(), 3);
        assert_eq!(answer.attention[0].len(), 2);
    }

    #[test]
    fn test_without_checkpoint_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AskUseCase::new(&dir.path().to_string_lossy()).is_err());
    }
}
