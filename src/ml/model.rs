// ============================================================
// Layer 5 — End-to-End Memory Network
// ============================================================
// Sukhbaatar et al. (2015) "End-To-End Memory Networks",
// weakly supervised, with adjacent weight tying.
//
// Parameters (Glorot-uniform initialised):
//   B      [n_words, d]           question embedding
//   E_0..E_K  [n_words, d]        memory embeddings, K = hops
//                                  hop k reads with A_k = E_k
//                                  and writes with C_k = E_{k+1}
//   H      [d, d]                 map between hops
//   W      [d, n_words]           answer projection
//
// Forward pass:
//   m_i^k = Σ_j E_k[x_ij]                 bag of words per fact
//   u_1   = Σ_j B[q_j]
//   p     = softmax(u_k · m^{k-1}ᵀ)        over memory slots
//   o_k   = Σ_i p_i m_i^k
//   u_k+1 = o_k + u_k H                   (all but the last hop)
//   â     = softmax((o_K + u_K) W)
//
// Padding ids embed to zero. Padded memory slots, flagged by
// the batcher, are masked out of every attention distribution.

use burn::{
    module::Param,
    nn::{loss::CrossEntropyLossConfig, Initializer},
    prelude::*,
    tensor::activation::softmax,
};

use crate::infra::vocab_store::PAD_ID;

/// Score given to padded memory slots before the softmax
const MASKED_SCORE: f32 = -1.0e9;

#[derive(Config, Debug)]
pub struct MemNetConfig {
    /// Vocabulary size, shared by inputs and output
    pub n_words: usize,
    #[config(default = 100)]
    pub embedding_dim: usize,
    #[config(default = 3)]
    pub hops: usize,
}

impl MemNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MemNet<B> {
        let hops = self.hops.max(1);
        let (n, d) = (self.n_words, self.embedding_dim);

        let glorot = Initializer::XavierUniform { gain: 1.0 };
        let matrix = |rows: usize, cols: usize| -> Param<Tensor<B, 2>> {
            glorot.init_with([rows, cols], Some(rows), Some(cols), device)
        };

        MemNet {
            question_embedding: matrix(n, d),
            memory_embeddings:  (0..=hops).map(|_| matrix(n, d)).collect(),
            hop_map:            matrix(d, d),
            answer_projection:  matrix(d, n),
            hops,
        }
    }
}

#[derive(Module, Debug)]
pub struct MemNet<B: Backend> {
    pub question_embedding: Param<Tensor<B, 2>>,
    pub memory_embeddings:  Vec<Param<Tensor<B, 2>>>,
    pub hop_map:            Param<Tensor<B, 2>>,
    pub answer_projection:  Param<Tensor<B, 2>>,
    pub hops:               usize,
}

pub struct MemNetOutput<B: Backend> {
    /// Unnormalised answer scores, [batch, n_words]
    pub logits:    Tensor<B, 2>,
    /// One attention distribution per hop, each [batch, facts]
    pub attention: Vec<Tensor<B, 2>>,
}

impl<B: Backend> MemNet<B> {
    /// facts: [batch, facts, words], question: [batch, words],
    /// memory_padding: [batch, facts] with true on padded slots
    pub fn forward(
        &self,
        facts:          Tensor<B, 3, Int>,
        question:       Tensor<B, 2, Int>,
        memory_padding: Tensor<B, 2, Bool>,
    ) -> MemNetOutput<B> {
        let [_, dim] = self.hop_map.dims();

        let memories: Vec<Tensor<B, 3>> = self
            .memory_embeddings
            .iter()
            .map(|table| embed_facts(table.val(), facts.clone()))
            .collect();

        let mut u = embed_question(self.question_embedding.val(), question);
        let mut attention = Vec::with_capacity(self.hops);
        let last = self.hops.saturating_sub(1);

        for hop in 0..last {
            let (o, p) = read_memory(&memories, hop, u.clone(), memory_padding.clone(), dim);
            attention.push(p);
            u = o + u.matmul(self.hop_map.val());
        }

        // The last hop skips H: its state goes straight to the output
        let (o, p) = read_memory(&memories, last, u.clone(), memory_padding, dim);
        attention.push(p);

        let logits = (o + u).matmul(self.answer_projection.val());
        MemNetOutput { logits, attention }
    }

    /// Output distribution over the vocabulary, [batch, n_words]
    pub fn forward_probs(
        &self,
        facts:          Tensor<B, 3, Int>,
        question:       Tensor<B, 2, Int>,
        memory_padding: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 2> {
        softmax(self.forward(facts, question, memory_padding).logits, 1)
    }

    /// Per-hop attention over the memory slots, each [batch, facts]
    pub fn attention(
        &self,
        facts:          Tensor<B, 3, Int>,
        question:       Tensor<B, 2, Int>,
        memory_padding: Tensor<B, 2, Bool>,
    ) -> Vec<Tensor<B, 2>> {
        self.forward(facts, question, memory_padding).attention
    }

    /// Mean cross entropy −log p[answer] over the batch
    pub fn forward_loss(
        &self,
        facts:          Tensor<B, 3, Int>,
        question:       Tensor<B, 2, Int>,
        memory_padding: Tensor<B, 2, Bool>,
        answers:        Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, MemNetOutput<B>) {
        let output = self.forward(facts, question, memory_padding);
        let ce = CrossEntropyLossConfig::new().init(&output.logits.device());
        let loss = ce.forward(output.logits.clone(), answers);
        (loss, output)
    }

    pub fn vocab_size(&self) -> usize {
        self.answer_projection.dims()[1]
    }
}

/// One hop: address memory `hop` with `u`, read from memory `hop + 1`.
/// Returns the read vector [batch, d] and the attention [batch, slots].
fn read_memory<B: Backend>(
    memories: &[Tensor<B, 3>],
    hop:      usize,
    u:        Tensor<B, 2>,
    padding:  Tensor<B, 2, Bool>,
    dim:      usize,
) -> (Tensor<B, 2>, Tensor<B, 2>) {
    let [batch, slots, _] = memories[hop].dims();

    // [batch, slots, d] x [batch, d, 1] → [batch, slots]
    let scores = memories[hop]
        .clone()
        .matmul(u.unsqueeze_dim::<3>(2))
        .reshape([batch, slots])
        .mask_fill(padding, MASKED_SCORE);
    let p = softmax(scores, 1);

    // [batch, 1, slots] x [batch, slots, d] → [batch, d]
    let o = p
        .clone()
        .unsqueeze_dim::<3>(1)
        .matmul(memories[hop + 1].clone())
        .reshape([batch, dim]);

    (o, p)
}

/// Bag-of-words embedding of every fact: [batch, slots, words] → [batch, slots, d]
fn embed_facts<B: Backend>(table: Tensor<B, 2>, ids: Tensor<B, 3, Int>) -> Tensor<B, 3> {
    let [batch, slots, words] = ids.dims();
    let [_, dim] = table.dims();

    let mask = ids
        .clone()
        .equal_elem(PAD_ID as i64)
        .bool_not()
        .float()
        .reshape([batch, slots, words, 1]);

    table
        .select(0, ids.reshape([batch * slots * words]))
        .reshape([batch, slots, words, dim])
        .mul(mask)
        .sum_dim(2)
        .reshape([batch, slots, dim])
}

/// Bag-of-words embedding of the question: [batch, words] → [batch, d]
fn embed_question<B: Backend>(table: Tensor<B, 2>, ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
    let [batch, words] = ids.dims();
    let [_, dim] = table.dims();

    let mask = ids
        .clone()
        .equal_elem(PAD_ID as i64)
        .bool_not()
        .float()
        .reshape([batch, words, 1]);

    table
        .select(0, ids.reshape([batch * words]))
        .reshape([batch, words, dim])
        .mul(mask)
        .sum_dim(1)
        .reshape([batch, dim])
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, data::dataloader::batcher::Batcher};

    use crate::data::{
        batcher::{MemBatch, MemBatcher},
        dataset::MemSample,
    };

    type TestBackend = NdArray;

    fn batch(samples: Vec<MemSample>) -> MemBatch<TestBackend> {
        MemBatcher::<TestBackend>::new(Default::default()).batch(samples)
    }

    fn sample(facts: Vec<Vec<u32>>, question: Vec<u32>) -> MemSample {
        MemSample::unlabelled(facts, question)
    }

    fn to_vec(t: Tensor<TestBackend, 2>) -> Vec<f32> {
        t.into_data().convert::<f32>().to_vec().unwrap()
    }

    /// Row-major [rows, cols] copy of a parameter
    fn weights(p: &Param<Tensor<TestBackend, 2>>) -> Vec<f32> {
        p.val().into_data().convert::<f32>().to_vec().unwrap()
    }

    fn row(table: &[f32], id: usize, dim: usize) -> Vec<f32> {
        table[id * dim..(id + 1) * dim].to_vec()
    }

    fn add(a: &[f32], b: &[f32]) -> Vec<f32> {
        a.iter().zip(b).map(|(x, y)| x + y).collect()
    }

    /// v [rows] times m [rows, cols]
    fn vec_mat(v: &[f32], m: &[f32], cols: usize) -> Vec<f32> {
        (0..cols)
            .map(|j| v.iter().enumerate().map(|(i, x)| x * m[i * cols + j]).sum())
            .collect()
    }

    #[test]
    fn test_output_shapes() {
        let model: MemNet<TestBackend> = MemNetConfig::new(12)
            .with_embedding_dim(8)
            .init(&Default::default());

        let b = batch(vec![sample(vec![vec![2, 3, 4]], vec![6, 7]), sample(vec![vec![5]], vec![8])]);
        let out = model.forward(b.facts, b.question, b.memory_padding);

        assert_eq!(out.logits.dims(), [2, 12]);
        assert_eq!(out.attention.len(), 3);
        assert_eq!(out.attention[0].dims(), [2, 1]);
        assert_eq!(model.memory_embeddings.len(), 4);
        assert_eq!(model.vocab_size(), 12);
    }

    #[test]
    fn test_logits_follow_adjacent_tying() {
        let (n, d) = (6, 3);
        let model: MemNet<TestBackend> = MemNetConfig::new(n)
            .with_embedding_dim(d)
            .init(&Default::default());

        let facts: Vec<Vec<usize>> = vec![vec![2, 3], vec![4]];
        let b = batch(vec![sample(vec![vec![2, 3], vec![4]], vec![5])]);
        let got = to_vec(model.forward(b.facts, b.question, b.memory_padding).logits);

        // Same pass by hand on plain vectors
        let tables: Vec<Vec<f32>> = model.memory_embeddings.iter().map(weights).collect();
        let h = weights(&model.hop_map);
        let w = weights(&model.answer_projection);

        let bag = |table: &[f32], ids: &[usize]| {
            ids.iter().fold(vec![0.0; d], |acc, &id| add(&acc, &row(table, id, d)))
        };
        let memories: Vec<Vec<Vec<f32>>> = tables
            .iter()
            .map(|t| facts.iter().map(|f| bag(t.as_slice(), f.as_slice())).collect())
            .collect();

        let mut u = row(&weights(&model.question_embedding), 5, d);
        let mut state = Vec::new();
        for hop in 0..model.hops {
            let scores: Vec<f32> = memories[hop]
                .iter()
                .map(|m| m.iter().zip(&u).map(|(a, b)| a * b).sum())
                .collect();
            let max = scores.iter().cloned().fold(f32::MIN, f32::max);
            let exp: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
            let total: f32 = exp.iter().sum();

            let o = memories[hop + 1]
                .iter()
                .zip(&exp)
                .fold(vec![0.0; d], |acc, (m, e)| {
                    add(&acc, &m.iter().map(|x| x * e / total).collect::<Vec<_>>())
                });

            if hop + 1 < model.hops {
                u = add(&o, &vec_mat(&u, &h, d));
            } else {
                state = add(&o, &u);
            }
        }
        let expected = vec_mat(&state, &w, n);

        assert_eq!(got.len(), n);
        for (g, e) in got.iter().zip(&expected) {
            assert!((g - e).abs() < 1e-4, "got {got:?}, expected {expected:?}");
        }
    }

    #[test]
    fn test_padded_slots_get_no_attention() {
        let model: MemNet<TestBackend> = MemNetConfig::new(10)
            .with_embedding_dim(6)
            .with_hops(2)
            .init(&Default::default());

        // The first sample has two facts, so its third slot is padding
        let b = batch(vec![
            sample(vec![vec![2, 3], vec![4]], vec![5, 6]),
            sample(vec![vec![7], vec![8], vec![9]], vec![5]),
        ]);
        let attention = model.attention(b.facts, b.question, b.memory_padding);
        assert_eq!(attention.len(), 2);

        for hop in attention {
            let p = to_vec(hop);
            assert!(p[2] < 1e-6, "padded slot got weight {}", p[2]);
            assert!((p[..3].iter().sum::<f32>() - 1.0).abs() < 1e-4);
            assert!((p[3..].iter().sum::<f32>() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_padding_does_not_change_the_answer() {
        let model: MemNet<TestBackend> = MemNetConfig::new(10)
            .with_embedding_dim(6)
            .init(&Default::default());

        let alone = batch(vec![sample(vec![vec![2, 3]], vec![4])]);
        let short = model.forward_probs(alone.facts, alone.question, alone.memory_padding);

        // Batched next to a longer sample, the first row gets padded everywhere
        let padded = batch(vec![
            sample(vec![vec![2, 3]], vec![4]),
            sample(vec![vec![5, 6, 7], vec![8]], vec![4, 9, 9]),
        ]);
        let long = model.forward_probs(padded.facts, padded.question, padded.memory_padding);

        for (a, b) in to_vec(short).iter().zip(to_vec(long)) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let model: MemNet<TestBackend> = MemNetConfig::new(9).init(&Default::default());
        let b = batch(vec![sample(vec![vec![2, 3]], vec![4])]);
        let probs = to_vec(model.forward_probs(b.facts, b.question, b.memory_padding));
        assert_eq!(probs.len(), 9);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_hops_is_raised_to_one() {
        let model: MemNet<TestBackend> = MemNetConfig::new(5).with_hops(0).init(&Default::default());
        assert_eq!(model.hops, 1);
        assert_eq!(model.memory_embeddings.len(), 2);
    }
}
