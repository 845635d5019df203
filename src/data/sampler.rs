// ============================================================
// Layer 4 — Sample Builder
// ============================================================
// Turns domain QaPairs into encoded MemSamples:
//
//   QaPair { facts, question, answer }      (strings)
//       │  Preprocessor::clean
//       ▼
//   Vocabulary::encode
//       ▼
//   MemSample { facts, question, answer }   (word ids)
//
// Rules:
//   - A question with no preceding fact is skipped; there is
//     no memory for it to attend over.
//   - Only the `memory_size` most recent facts are kept
//     (0 keeps everything).
//   - Facts that clean to nothing are dropped.

use anyhow::Result;

use crate::data::{dataset::MemSample, preprocessor::Preprocessor};
use crate::domain::{qa_pair::QaPair, story::{Story, StoryLine}};
use crate::infra::vocab_store::Vocabulary;

pub struct SampleBuilder {
    preprocessor: Preprocessor,
    memory_size:  usize,
}

impl SampleBuilder {
    pub fn new(memory_size: usize) -> Self {
        Self { preprocessor: Preprocessor::new(), memory_size }
    }

    /// Encode every question of every story.
    pub fn build(&self, stories: &[Story], vocab: &Vocabulary) -> Result<Vec<MemSample>> {
        let mut samples = Vec::new();
        let mut skipped = 0usize;

        for pair in stories.iter().flat_map(Story::qa_pairs) {
            match self.encode_pair(&pair, vocab)? {
                Some(sample) => samples.push(sample),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::debug!("Skipped {} questions without memory", skipped);
        }
        Ok(samples)
    }

    /// Encode a single pair, or None when it has no usable memory.
    pub fn encode_pair(&self, pair: &QaPair, vocab: &Vocabulary) -> Result<Option<MemSample>> {
        if pair.has_no_memory() {
            return Ok(None);
        }

        let (facts, _) = self.encode_facts(&pair.facts, vocab)?;
        if facts.is_empty() {
            return Ok(None);
        }

        let question = vocab.encode(&self.preprocessor.clean(&pair.question))?;
        let answer   = vocab.id(&self.preprocessor.clean_answer(&pair.answer));

        Ok(Some(MemSample { facts, question, answer }))
    }

    /// Encode the facts that fit in memory.
    /// Also returns, for each kept fact, its index in `facts`.
    pub fn encode_facts(
        &self,
        facts: &[String],
        vocab: &Vocabulary,
    ) -> Result<(Vec<Vec<u32>>, Vec<usize>)> {
        let mut encoded = Vec::new();
        let mut origin  = Vec::new();

        for (i, fact) in facts.iter().enumerate() {
            let ids = vocab.encode(&self.preprocessor.clean(fact))?;
            if !ids.is_empty() {
                encoded.push(ids);
                origin.push(i);
            }
        }

        if self.memory_size > 0 && encoded.len() > self.memory_size {
            let drop = encoded.len() - self.memory_size;
            encoded.drain(..drop);
            origin.drain(..drop);
        }

        Ok((encoded, origin))
    }

    /// Every cleaned word of the corpus in first-seen order,
    /// answers included, for building the vocabulary.
    pub fn corpus_words(&self, stories: &[Story]) -> Vec<String> {
        let mut words = Vec::new();

        for line in stories.iter().flat_map(|s| s.lines.iter()) {
            match line {
                StoryLine::Fact { text, .. } => {
                    words.extend(self.preprocessor.clean(text).split_whitespace().map(String::from));
                }
                StoryLine::Question { text, answer, .. } => {
                    words.extend(self.preprocessor.clean(text).split_whitespace().map(String::from));
                    words.push(self.preprocessor.clean_answer(answer));
                }
            }
        }

        words
    }
}
