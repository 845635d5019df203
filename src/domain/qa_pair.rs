// ============================================================
// Layer 3 — QaPair Domain Type
// ============================================================
// One question in the "weakly supervised" view of a story:
// the model gets every preceding fact as memory and only the
// answer word as a training signal. The supporting fact ids
// are kept for inspection but never used to train.
//
// Example:
//   facts:    ["Mary moved to the bathroom.", "John went to the hallway."]
//   question: "Where is Mary?"
//   answer:   "bathroom"

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    /// Id of the story this question belongs to
    pub story: usize,

    /// Line number of the question inside its story
    pub line_no: usize,

    /// Facts preceding the question, oldest first
    pub facts: Vec<String>,

    pub question: String,

    pub answer: String,

    /// Line numbers of the supporting facts
    pub supporting: Vec<usize>,
}

impl QaPair {
    /// True when there is nothing in memory to attend over
    pub fn has_no_memory(&self) -> bool {
        self.facts.is_empty()
    }
}
