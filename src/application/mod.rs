// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each:
// training, evaluating a checkpoint, or answering a question.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

// The training workflow
pub mod train_use_case;

// Scoring a checkpoint on a story file
pub mod evaluate_use_case;

// Answering one question about a story
pub mod ask_use_case;
