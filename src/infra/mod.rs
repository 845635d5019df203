// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence concerns:
//
//   checkpoint.rs   — model weights (Burn CompactRecorder),
//                     model and training configs as JSON
//
//   vocab_store.rs  — the word vocabulary, stored as a
//                     word-level tokenizer.json so training
//                     and inference share the same ids
//
//   metrics.rs      — per-epoch metrics appended to a CSV
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Vocabulary building, saving, and loading
pub mod vocab_store;

/// Training metrics CSV logger
pub mod metrics;
