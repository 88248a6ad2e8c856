// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads the word-level tokenizer saved beside the checkpoint,
// or builds one from the training titles when none exists yet.
//
// The vocabulary is written straight into Hugging Face tokenizer
// JSON (WordLevel model, BERT normaliser with CJK splitting,
// whitespace pre-tokenizer) and parsed back, which avoids the
// trainer type plumbing of the tokenizers crate.
//
// Building is deterministic: terms are ordered by descending
// frequency, ties broken lexicographically. Once saved, the same
// tokenizer is reused by every later run so token ids stay
// stable across incremental training. A built tokenizer is
// saved together with the first promoted checkpoint.

use std::{collections::HashMap, fs, path::PathBuf};

use tokenizers::Tokenizer;

use crate::domain::error::{PipelineError, PipelineResult};

pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;
const SPECIAL_TOKENS: usize = 2;

pub struct TokenizerStore {
    path: PathBuf,
}

impl TokenizerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the saved tokenizer, or build one in memory from `texts`.
    /// A built tokenizer is only written by `save`, once its model is promoted.
    pub fn load_or_build(&self, texts: &[String], vocab_size: usize) -> PipelineResult<Tokenizer> {
        if self.path.exists() {
            tracing::info!("Loading existing tokenizer from '{}'", self.path.display());
            self.load()
        } else {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            build_tokenizer(texts, vocab_size)
        }
    }

    pub fn load(&self) -> PipelineResult<Tokenizer> {
        Tokenizer::from_file(&self.path).map_err(|e| {
            PipelineError::Tokenizer(format!("cannot load '{}': {e}", self.path.display()))
        })
    }

    /// Write `tokenizer` unless one is already saved; the first saved
    /// vocabulary stays fixed for every later checkpoint.
    pub fn save(&self, tokenizer: &Tokenizer) -> PipelineResult<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        tokenizer.save(&self.path, true).map_err(|e| {
            PipelineError::Tokenizer(format!("cannot save '{}': {e}", self.path.display()))
        })?;
        tracing::info!("Tokenizer saved to '{}'", self.path.display());
        Ok(())
    }
}

/// Build a tokenizer in memory without touching disk.
pub fn build_tokenizer(texts: &[String], vocab_size: usize) -> PipelineResult<Tokenizer> {
    let json = tokenizer_json(texts, vocab_size);
    parse_tokenizer(&json.to_string())
}

fn parse_tokenizer(text: &str) -> PipelineResult<Tokenizer> {
    text.parse::<Tokenizer>()
        .map_err(|e| PipelineError::Tokenizer(format!("invalid tokenizer JSON: {e}")))
}

fn tokenizer_json(texts: &[String], vocab_size: usize) -> serde_json::Value {
    let mut freq: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for term in vocab_terms(text) {
            *freq.entry(term).or_insert(0) += 1;
        }
    }

    let mut terms: Vec<(String, usize)> = freq.into_iter().collect();
    terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    terms.truncate(vocab_size.saturating_sub(SPECIAL_TOKENS));

    let mut vocab = serde_json::Map::new();
    vocab.insert("[PAD]".into(), PAD_ID.into());
    vocab.insert("[UNK]".into(), UNK_ID.into());
    for (offset, (term, _)) in terms.iter().enumerate() {
        vocab.insert(term.clone(), (offset + SPECIAL_TOKENS).into());
    }
    tracing::debug!("Tokenizer vocabulary has {} entries", vocab.len());

    serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [
            {"id": PAD_ID, "content": "[PAD]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
            {"id": UNK_ID, "content": "[UNK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
        ],
        "normalizer": {
            "type": "BertNormalizer",
            "clean_text": true,
            "handle_chinese_chars": true,
            "strip_accents": null,
            "lowercase": true
        },
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": vocab,
            "unk_token": "[UNK]"
        }
    })
}

/// Split text the way the normaliser + pre-tokenizer will:
/// lowercase, one token per CJK ideograph, word runs, punctuation runs.
pub fn vocab_terms(text: &str) -> Vec<String> {
    fn flush(buf: &mut String, out: &mut Vec<String>) {
        if !buf.is_empty() {
            out.push(std::mem::take(buf));
        }
    }

    let mut out   = Vec::new();
    let mut word  = String::new();
    let mut punct = String::new();

    for c in text.chars().flat_map(char::to_lowercase) {
        if is_cjk(c) {
            flush(&mut word, &mut out);
            flush(&mut punct, &mut out);
            out.push(c.to_string());
        } else if c.is_whitespace() || c.is_control() {
            flush(&mut word, &mut out);
            flush(&mut punct, &mut out);
        } else if c.is_alphanumeric() || c == '_' {
            flush(&mut punct, &mut out);
            word.push(c);
        } else {
            flush(&mut word, &mut out);
            punct.push(c);
        }
    }
    flush(&mut word, &mut out);
    flush(&mut punct, &mut out);
    out
}

fn is_cjk(c: char) -> bool {
    matches!(
        c as u32,
        0x4E00..=0x9FFF
            | 0x3400..=0x4DBF
            | 0x20000..=0x2A6DF
            | 0x2A700..=0x2B73F
            | 0x2B740..=0x2B81F
            | 0x2B820..=0x2CEAF
            | 0xF900..=0xFAFF
            | 0x2F800..=0x2FA1F
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocab_terms_split_cjk_and_words() {
        assert_eq!(
            vocab_terms("AI讲座: Deep Learning"),
            vec!["ai", "讲", "座", ":", "deep", "learning"]
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let texts = vec!["b a a".to_string(), "c b a".to_string()];
        let one = tokenizer_json(&texts, 100);
        let two = tokenizer_json(&texts, 100);
        assert_eq!(one, two);
        // a(3) > b(2) > c(1)
        assert_eq!(one["model"]["vocab"]["a"], 2);
        assert_eq!(one["model"]["vocab"]["b"], 3);
        assert_eq!(one["model"]["vocab"]["c"], 4);
    }

    #[test]
    fn test_vocab_size_caps_terms() {
        let texts = vec!["a b c d e".to_string()];
        let json  = tokenizer_json(&texts, 4);
        assert_eq!(json["model"]["vocab"].as_object().map(|m| m.len()), Some(4));
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let tok = build_tokenizer(&["放假 通知".to_string()], 64).unwrap();
        let enc = tok.encode("放假 zebra", false).unwrap();
        let ids = enc.get_ids();
        assert_eq!(ids.len(), 3);
        assert_ne!(ids[0], UNK_ID);
        assert_eq!(ids[2], UNK_ID);
    }

    #[test]
    fn test_store_builds_in_memory_then_reloads_saved() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().join("models").join("tokenizer.json"));
        let texts = vec!["招聘 信息".to_string()];
        let built = store.load_or_build(&texts, 32).unwrap();
        assert!(!store.path().exists());

        store.save(&built).unwrap();
        assert!(store.path().exists());

        // once saved, different texts must not change the vocabulary
        let loaded = store.load_or_build(&["other words".to_string()], 32).unwrap();
        assert_eq!(
            built.encode("招聘", false).unwrap().get_ids(),
            loaded.encode("招聘", false).unwrap().get_ids()
        );
    }
}
