// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a bAbI text file to padded tensor batches:
//
//   qaN_train.txt
//       │
//       ▼
//   BabiLoader        → parses numbered lines into Stories
//       │
//       ▼
//   Preprocessor      → lowercases, strips punctuation
//       │
//       ▼
//   SampleBuilder     → QaPairs → word ids, memory window
//       │
//       ▼
//   MemDataset        → implements Burn's Dataset trait
//       │
//       ▼
//   MemBatcher        → pads samples into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Parses bAbI story files
pub mod loader;

/// Normalises raw text before encoding
pub mod preprocessor;

/// Encodes question/fact pairs into word-id samples
pub mod sampler;

/// Implements Burn's Dataset trait for memory samples
pub mod dataset;

/// Implements Burn's Batcher trait to create padded batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
