// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Answers one question about a list of free-text facts with a
// trained checkpoint. Besides the answer word it reports the
// attention each hop paid to every fact, which shows which
// facts the model actually used.
//
// Inference runs on the CPU backend: one question at a time
// is far too little work to pay for a GPU round trip.

use anyhow::{Context, Result};
use burn::prelude::*;

use crate::data::{batcher::MemBatcher, dataset::MemSample, preprocessor::Preprocessor, sampler::SampleBuilder};
use crate::domain::traits::{Answer, QuestionAnswerer};
use crate::infra::{checkpoint::CheckpointManager, vocab_store::Vocabulary};
use crate::ml::{backend::CpuBackend, model::MemNet};

use burn::data::dataloader::batcher::Batcher;

type InferBackend = CpuBackend;

pub struct Inferencer {
    model:   MemNet<InferBackend>,
    vocab:   Vocabulary,
    sampler: SampleBuilder,
    device:  <InferBackend as Backend>::Device,
}

impl Inferencer {
    pub fn from_checkpoint(
        ckpt:        &CheckpointManager,
        vocab:       Vocabulary,
        memory_size: usize,
    ) -> Result<Self> {
        let device = Default::default();
        let cfg    = ckpt.load_model_config()?;

        if cfg.n_words != vocab.len() {
            anyhow::bail!(
                "Vocabulary has {} words but the model was trained with {}",
                vocab.len(),
                cfg.n_words
            );
        }

        let model: MemNet<InferBackend> = cfg.init(&device);
        let model = ckpt.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint");

        Ok(Self { model, vocab, sampler: SampleBuilder::new(memory_size), device })
    }

    fn predict(&self, facts: &[String], question: &str) -> Result<Answer> {
        let (encoded, origin) = self.sampler.encode_facts(facts, &self.vocab)?;
        let question_ids = self.vocab.encode(&Preprocessor::new().clean(question))?;

        let batch = MemBatcher::<InferBackend>::new(self.device.clone())
            .batch(vec![MemSample::unlabelled(encoded, question_ids)]);

        let probs: Vec<f32> = self
            .model
            .forward_probs(batch.facts.clone(), batch.question.clone(), batch.memory_padding.clone())
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("Cannot read output distribution: {e:?}"))?;

        let (best, confidence) = probs
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .context("Empty output distribution")?;

        let word = self
            .vocab
            .word(best as u32)
            .unwrap_or_else(|| format!("#{best}"));

        // Map attention over kept memory slots back onto the caller's facts
        let hops = self.model.attention(batch.facts, batch.question, batch.memory_padding);
        let mut attention = Vec::with_capacity(hops.len());
        for hop in hops {
            let weights: Vec<f32> = hop
                .into_data()
                .convert::<f32>()
                .to_vec()
                .map_err(|e| anyhow::anyhow!("Cannot read attention weights: {e:?}"))?;

            let mut per_fact = vec![0.0f32; facts.len()];
            for (slot, &fact_idx) in origin.iter().enumerate() {
                per_fact[fact_idx] = weights[slot];
            }
            attention.push(per_fact);
        }

        tracing::debug!("Predicted '{}' with p={:.4}", word, confidence);
        Ok(Answer { word, confidence, attention })
    }
}

impl QuestionAnswerer for Inferencer {
    fn answer(&self, facts: &[String], question: &str) -> Result<Answer> {
        self.predict(facts, question)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::infra::vocab_store::VocabStore;
    use crate::ml::model::MemNetConfig;

    fn setup() -> (tempfile::TempDir, Inferencer) {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().to_string_lossy().to_string();

        let words = ["mary", "went", "to", "the", "kitchen", "where", "is", "garden"];
        let vocab = VocabStore::new(path.clone()).build_and_save(words).unwrap();

        let ckpt = CheckpointManager::new(path).unwrap();
        let cfg  = MemNetConfig::new(vocab.len()).with_embedding_dim(8);
        ckpt.save_model_config(&cfg).unwrap();
        let model: MemNet<Autodiff<NdArray>> = cfg.init(&Default::default());
        ckpt.save_model(&model, 1).unwrap();

        let inferencer = Inferencer::from_checkpoint(&ckpt, vocab, 0).unwrap();
        (dir, inferencer)
    }

    #[test]
    fn test_answer_reports_attention_per_fact() {
        let (_dir, inferencer) = setup();
        let facts = vec![
            "Mary went to the kitchen.".to_string(),
            "...".to_string(),
            "Mary went to the garden.".to_string(),
        ];
        let answer = inferencer.answer(&facts, "Where is Mary?").unwrap();

        assert!(!answer.word.is_empty());
        assert!(answer.confidence > 0.0 && answer.confidence <= 1.0);
        assert_eq!(answer.attention.len(), 3);
        for hop in &answer.attention {
            assert_eq!(hop.len(), 3);
            // The punctuation-only fact never reaches memory
            assert_eq!(hop[1], 0.0);
            assert!((hop.iter().sum::<f32>() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_vocabulary_mismatch_is_rejected() {
        let (dir, _) = setup();
        let path  = dir.path().join("other").to_string_lossy().to_string();
        let small = VocabStore::new(path).build_and_save(["mary"]).unwrap();
        let ckpt  = CheckpointManager::new(dir.path().to_string_lossy().to_string()).unwrap();
        assert!(Inferencer::from_checkpoint(&ckpt, small, 0).is_err());
    }
}
