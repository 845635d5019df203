// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Normalises facts, questions and answers before they are
// turned into vocabulary ids.
//
// The model is a bag-of-words model: word order and casing
// carry no information, and punctuation would only add
// useless vocabulary entries ("bathroom." vs "bathroom").
//
// Cleaning steps (applied in order):
//   1. Lowercase
//   2. Replace punctuation and control characters with space
//   3. Collapse runs of whitespace into a single space
//
// Answers get one extra rule: bAbI list answers such as
// "apple,football" must stay ONE output word, so their parts
// are joined with '_' instead of being split.
//
// Reference: Rust Book §8 (Strings in Rust)

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean a fact or question into space-separated lowercase words.
    pub fn clean(&self, text: &str) -> String {
        let normalised: String = text
            .chars()
            .map(|c| match c {
                // '_' is kept because cleaned answers use it as a joiner
                c if c.is_alphanumeric() || c == '_' => c,
                _ => ' ',
            })
            .flat_map(char::to_lowercase)
            .collect();

        normalised.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Clean an answer into a single vocabulary word.
    pub fn clean_answer(&self, answer: &str) -> String {
        self.clean(answer).replace(' ', "_")
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
