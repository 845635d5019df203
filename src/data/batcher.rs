// ============================================================
// Layer 4 — Memory Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<MemSample>
// into padded tensors.
//
// Samples differ in three lengths: number of facts, words per
// fact, words per question. Every batch is padded to its own
// maxima with PAD (id 0):
//
//   facts:          [batch, max_facts, max_fact_words]
//   question:       [batch, max_question_words]
//   memory_padding: [batch, max_facts]   true = padded slot
//   answers:        [batch]
//
// The model masks padded slots out of every attention
// distribution.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::MemSample;
use crate::infra::vocab_store::PAD_ID;

#[derive(Debug, Clone)]
pub struct MemBatch<B: Backend> {
    /// Fact word ids, shape [batch, facts, words]
    pub facts: Tensor<B, 3, Int>,

    /// Question word ids, shape [batch, words]
    pub question: Tensor<B, 2, Int>,

    /// Memory slots past the end of each sample, shape [batch, facts]
    pub memory_padding: Tensor<B, 2, Bool>,

    /// Answer word ids, shape [batch]
    pub answers: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct MemBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> MemBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<MemSample, MemBatch<B>> for MemBatcher<B> {
    fn batch(&self, items: Vec<MemSample>) -> MemBatch<B> {
        let batch_size = items.len();

        // At least one slot / word so shapes never collapse to zero
        let n_facts = items.iter().map(MemSample::memory_len).max().unwrap_or(0).max(1);
        let n_words = items.iter().map(MemSample::longest_fact).max().unwrap_or(0).max(1);
        let n_query = items.iter().map(|s| s.question.len()).max().unwrap_or(0).max(1);

        let pad = PAD_ID as i64;

        // ── Facts: [batch, n_facts, n_words] ──────────────────────────────────
        let mut fact_flat = vec![pad; batch_size * n_facts * n_words];
        for (b, item) in items.iter().enumerate() {
            for (f, fact) in item.facts.iter().enumerate() {
                let offset = (b * n_facts + f) * n_words;
                for (w, &id) in fact.iter().enumerate() {
                    fact_flat[offset + w] = id as i64;
                }
            }
        }

        // ── Padded slots: [batch, n_facts] ────────────────────────────────────
        let mut padding_flat = vec![true; batch_size * n_facts];
        for (b, item) in items.iter().enumerate() {
            padding_flat[b * n_facts..b * n_facts + item.memory_len()].fill(false);
        }

        // ── Question: [batch, n_query] ────────────────────────────────────────
        let mut query_flat = vec![pad; batch_size * n_query];
        for (b, item) in items.iter().enumerate() {
            for (w, &id) in item.question.iter().enumerate() {
                query_flat[b * n_query + w] = id as i64;
            }
        }

        let answers: Vec<i64> = items.iter().map(|s| s.answer as i64).collect();

        let facts = Tensor::<B, 3, Int>::from_data(
            TensorData::new(fact_flat, [batch_size, n_facts, n_words]),
            &self.device,
        );
        let question = Tensor::<B, 2, Int>::from_data(
            TensorData::new(query_flat, [batch_size, n_query]),
            &self.device,
        );
        let memory_padding = Tensor::<B, 2, Bool>::from_data(
            TensorData::new(padding_flat, [batch_size, n_facts]),
            &self.device,
        );
        let answers = Tensor::<B, 1, Int>::from_data(
            TensorData::new(answers, [batch_size]),
            &self.device,
        );

        MemBatch { facts, question, memory_padding, answers }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_pads_to_batch_maxima() {
        let batcher = MemBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![
            MemSample { facts: vec![vec![2, 3], vec![4]], question: vec![5], answer: 6 },
            MemSample { facts: vec![vec![7, 8, 9]],       question: vec![5, 10], answer: 11 },
        ]);

        assert_eq!(batch.facts.dims(), [2, 2, 3]);
        assert_eq!(batch.question.dims(), [2, 2]);
        assert_eq!(batch.answers.dims(), [2]);

        let facts: Vec<i64> = batch.facts.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(facts, vec![2, 3, 0, 4, 0, 0, 7, 8, 9, 0, 0, 0]);

        let question: Vec<i64> = batch.question.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(question, vec![5, 0, 5, 10]);

        let padding: Vec<bool> = batch.memory_padding.into_data().to_vec().unwrap();
        assert_eq!(padding, vec![false, false, false, true]);
    }

    #[test]
    fn test_empty_memory_still_has_one_slot() {
        let batcher = MemBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![MemSample::unlabelled(vec![], vec![3])]);
        assert_eq!(batch.facts.dims(), [1, 1, 1]);
        let padding: Vec<bool> = batch.memory_padding.into_data().to_vec().unwrap();
        assert_eq!(padding, vec![true]);
    }
}
