use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::infra::vocab_store::PAD_ID;

/// One encoded question with its memory.
/// Facts and question are bags of word ids; lengths vary freely
/// and are padded only when a batch is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemSample {
    /// Oldest fact first, at most `memory_size` of them
    pub facts:    Vec<Vec<u32>>,
    pub question: Vec<u32>,
    pub answer:   u32,
}

impl MemSample {
    /// A sample for inference, where the answer is unknown
    pub fn unlabelled(facts: Vec<Vec<u32>>, question: Vec<u32>) -> Self {
        Self { facts, question, answer: PAD_ID }
    }

    pub fn memory_len(&self) -> usize {
        self.facts.len()
    }

    pub fn longest_fact(&self) -> usize {
        self.facts.iter().map(Vec::len).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemDataset {
    samples: Vec<MemSample>,
}

impl MemDataset {
    pub fn new(samples: Vec<MemSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<MemSample> for MemDataset {
    fn get(&self, index: usize) -> Option<MemSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
