// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Builds, saves and loads the word vocabulary shared by the
// fact embeddings, the question embedding and the output
// softmax.
//
// The vocabulary is stored as a HuggingFace word-level
// tokenizer.json so the exact same id mapping is used during
// training, evaluation and `ask`.
//
// Id layout:
//   0      [PAD]  — padding; embeds to nothing
//   1      [UNK]  — any word not seen during training
//   2..n   words in order of first appearance in the
//          training stories
//
// Only the training file contributes words. Words that only
// appear in the test file map to [UNK], exactly as a model
// that never saw them would treat them.
//
// Reference: tokenizers crate (WordLevel model)

use anyhow::{Context, Result};
use std::{collections::HashSet, path::PathBuf};
use tokenizers::Tokenizer;

pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;
pub const PAD_TOKEN: &str = "[PAD]";
pub const UNK_TOKEN: &str = "[UNK]";

const VOCAB_FILE: &str = "tokenizer.json";

/// Word ↔ id mapping backed by a word-level tokenizer.
pub struct Vocabulary {
    tokenizer: Tokenizer,
    size:      usize,
}

impl Vocabulary {
    fn new(tokenizer: Tokenizer) -> Self {
        // Ids are contiguous, so the size is the largest id + 1
        let size = tokenizer
            .get_vocab(true)
            .values()
            .max()
            .map_or(0, |max| *max as usize + 1);
        Self { tokenizer, size }
    }

    /// Number of ids, including [PAD] and [UNK]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Encode already-cleaned text into word ids
    pub fn encode(&self, cleaned: &str) -> Result<Vec<u32>> {
        let enc = self
            .tokenizer
            .encode(cleaned, false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
        Ok(enc.get_ids().to_vec())
    }

    /// Id of a single word, [UNK] if unknown
    pub fn id(&self, word: &str) -> u32 {
        self.tokenizer.token_to_id(word).unwrap_or(UNK_ID)
    }

    pub fn word(&self, id: u32) -> Option<String> {
        self.tokenizer.id_to_token(id)
    }
}

pub struct VocabStore {
    dir: PathBuf,
}

impl VocabStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    pub fn load(&self) -> Result<Vocabulary> {
        let path = self.dir.join(VOCAB_FILE);
        let tokenizer = Tokenizer::from_file(&path).map_err(|e| {
            anyhow::anyhow!(
                "Cannot load vocabulary from '{}': {}. Have you run 'train' first?",
                path.display(),
                e
            )
        })?;
        Ok(Vocabulary::new(tokenizer))
    }

    /// Build a vocabulary from cleaned words (in first-seen order),
    /// write it to disk and load it back.
    pub fn build_and_save<'a, I>(&self, words: I) -> Result<Vocabulary>
    where
        I: IntoIterator<Item = &'a str>,
    {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let mut vocab = serde_json::json!({
            PAD_TOKEN: PAD_ID,
            UNK_TOKEN: UNK_ID,
        });

        let mut seen    = HashSet::new();
        let mut next_id = 2u32;
        for word in words {
            if word.is_empty() || word == PAD_TOKEN || word == UNK_TOKEN {
                continue;
            }
            if seen.insert(word.to_string()) {
                vocab[word] = serde_json::json!(next_id);
                next_id += 1;
            }
        }

        // Same layout Tokenizer::from_file() expects
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": PAD_ID, "content": PAD_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": UNK_ID, "content": UNK_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": null,
            "pre_tokenizer": {
                "type": "WhitespaceSplit"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let path = self.dir.join(VOCAB_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write vocabulary to '{}'", path.display()))?;

        tracing::info!("Vocabulary built with {} ids, saved to '{}'", next_id, path.display());

        self.load()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn build(words: &[&str]) -> (tempfile::TempDir, Vocabulary) {
        let dir   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path().to_string_lossy().to_string());
        let vocab = store.build_and_save(words.iter().copied()).unwrap();
        (dir, vocab)
    }

    #[test]
    fn test_ids_follow_first_appearance() {
        let (_dir, vocab) = build(&["mary", "went", "mary", "home"]);
        assert_eq!(vocab.id("mary"), 2);
        assert_eq!(vocab.id("went"), 3);
        assert_eq!(vocab.id("home"), 4);
        assert_eq!(vocab.len(), 5);
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let (_dir, vocab) = build(&["mary"]);
        assert_eq!(vocab.id("garden"), UNK_ID);
        assert_eq!(vocab.encode("mary garden").unwrap(), vec![2, UNK_ID]);
    }

    #[test]
    fn test_round_trips_through_disk() {
        let (dir, vocab) = build(&["john", "kitchen"]);
        let reloaded = VocabStore::new(dir.path().to_string_lossy().to_string())
            .load()
            .unwrap();
        assert_eq!(reloaded.len(), vocab.len());
        assert_eq!(reloaded.word(3).as_deref(), Some("kitchen"));
    }

    #[test]
    fn test_load_without_training_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(VocabStore::new(dir.path().to_string_lossy().to_string()).load().is_err());
    }
}
