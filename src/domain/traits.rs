// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits so the
// story format and the answering strategy can be swapped.
//
//   - BabiLoader implements StorySource
//   - Inferencer implements QuestionAnswerer
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::story::Story;

// ─── StorySource ──────────────────────────────────────────────────────────────
/// Any component that can produce parsed stories.
pub trait StorySource {
    fn load_all(&self) -> Result<Vec<Story>>;
}

// ─── Answer ───────────────────────────────────────────────────────────────────
/// A predicted answer with the attention the model paid to each fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub word:       String,
    /// Probability of `word` under the output softmax
    pub confidence: f32,
    /// attention[hop][fact]: one distribution per memory hop
    pub attention:  Vec<Vec<f32>>,
}

impl Answer {
    /// Index of the fact with the highest attention in the given hop
    pub fn focus(&self, hop: usize) -> Option<usize> {
        self.attention.get(hop).and_then(|weights| {
            weights
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
        })
    }
}

// ─── QuestionAnswerer ─────────────────────────────────────────────────────────
/// Any component that can answer a question about a list of facts.
pub trait QuestionAnswerer {
    fn answer(&self, facts: &[String], question: &str) -> Result<Answer>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_picks_highest_weight() {
        let a = Answer {
            word:       "kitchen".into(),
            confidence: 0.9,
            attention:  vec![vec![0.1, 0.7, 0.2], vec![0.5, 0.2, 0.3]],
        };
        assert_eq!(a.focus(0), Some(1));
        assert_eq!(a.focus(1), Some(0));
        assert_eq!(a.focus(2), None);
    }
}
