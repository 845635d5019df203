// ============================================================
// Layer 5 — Evaluation Loop
// ============================================================
// Runs the model over a dataset without gradients and counts
// how many questions get the right answer word.
//
// The prediction is the argmax of the output distribution;
// argmax of the logits gives the same word, so the softmax is
// never materialised here.
//
// A question whose answer is outside the vocabulary encodes to
// [UNK]. It always counts as wrong, even when [UNK] is predicted.

use burn::{
    data::dataloader::DataLoaderBuilder,
    prelude::*,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::{batcher::MemBatcher, dataset::MemDataset};
use crate::infra::vocab_store::UNK_ID;
use crate::ml::model::MemNet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub correct:  usize,
    pub wrong:    usize,
    /// Sum of per-question cross entropy
    pub loss_sum: f64,
}

impl EvalReport {
    pub fn total(&self) -> usize {
        self.correct + self.wrong
    }

    pub fn accuracy(&self) -> f64 {
        if self.total() == 0 { 0.0 } else { self.correct as f64 / self.total() as f64 }
    }

    pub fn mean_loss(&self) -> f64 {
        if self.total() == 0 { f64::NAN } else { self.loss_sum / self.total() as f64 }
    }
}

impl fmt::Display for EvalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} correct, {} wrong", self.correct, self.wrong)
    }
}

pub fn evaluate<B: Backend>(
    model:      &MemNet<B>,
    dataset:    MemDataset,
    batch_size: usize,
    device:     &B::Device,
) -> EvalReport {
    let mut report = EvalReport::default();
    if dataset.sample_count() == 0 {
        return report;
    }

    let loader = DataLoaderBuilder::new(MemBatcher::<B>::new(device.clone()))
        .batch_size(batch_size.max(1))
        .build(dataset);

    for batch in loader.iter() {
        let n = batch.answers.dims()[0];
        let (loss, output) = model.forward_loss(
            batch.facts,
            batch.question,
            batch.memory_padding,
            batch.answers.clone(),
        );

        report.loss_sum += loss.into_scalar().elem::<f64>() * n as f64;

        // argmax(1) returns [batch, 1]
        let predicted = output.logits.argmax(1).reshape([n]);
        let known = batch.answers.clone().equal_elem(UNK_ID as i64).bool_not().int();
        let hits = predicted
            .equal(batch.answers)
            .int()
            .mul(known)
            .sum()
            .into_scalar()
            .elem::<i64>() as usize;

        report.correct += hits;
        report.wrong   += n - hits;
    }

    tracing::debug!("Evaluated {} questions: {}", report.total(), report);
    report
}
