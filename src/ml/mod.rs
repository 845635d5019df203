// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model, training and evaluation code lives here.
//
//   model.rs      — the end-to-end memory network: bag-of-words
//                   memories, multi-hop soft attention, answer
//                   projection, cross-entropy loss
//
//   trainer.rs    — the training loop: optimiser selection,
//                   learning-rate schedule, validation,
//                   periodic train/test scoring, checkpoints
//
//   evaluator.rs  — argmax prediction and correct/wrong counts
//
//   inferencer.rs — answers a single question from a checkpoint
//
//   schedule.rs   — piecewise-constant learning-rate schedule
//
//   backend.rs    — concrete backend choice (NdArray / Wgpu)
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Sukhbaatar et al. (2015) End-To-End Memory Networks

/// End-to-end memory network architecture
pub mod model;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Evaluation loop
pub mod evaluator;

/// Inference engine — loads checkpoint and answers a question
pub mod inferencer;

/// Learning-rate schedule
pub mod schedule;

/// Backend selection
pub mod backend;
