//! Tokenizer adapter.

use std::path::Path;

use tokenizers::Tokenizer;
use tracing::info;

use crate::error::TokenizerError;

/// Maps text to token ids and back.
pub trait TokenCodec: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError>;

    fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError>;
}

/// HuggingFace tokenizer, loaded from a `tokenizer.json` path or a hub id.
pub struct HfTokenizer {
    inner: Tokenizer,
    name: String,
}

impl HfTokenizer {
    /// Load from a local file when `name_or_path` exists, otherwise resolve it
    /// on the HuggingFace hub. Blocks on network I/O in the hub case.
    pub fn load(name_or_path: &str) -> Result<Self, TokenizerError> {
        let load_err = |reason: String| TokenizerError::Load {
            name: name_or_path.to_string(),
            reason,
        };

        let path = Path::new(name_or_path);
        let mut inner = if path.exists() {
            Tokenizer::from_file(path)
        } else {
            Tokenizer::from_pretrained(name_or_path, None)
        }
        .map_err(|e| load_err(e.to_string()))?;

        // Windows must be exactly chunk_size tokens; the model files may ship
        // with truncation or padding enabled.
        inner
            .with_truncation(None)
            .map_err(|e| load_err(e.to_string()))?;
        inner.with_padding(None);

        info!(tokenizer = name_or_path, "tokenizer loaded");

        Ok(Self {
            inner,
            name: name_or_path.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TokenCodec for HfTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| TokenizerError::Encode(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError> {
        self.inner
            .decode(tokens, false)
            .map_err(|e| TokenizerError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORD_LEVEL_JSON: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": { "[UNK]": 0, "hello": 1, "world": 2 },
            "unk_token": "[UNK]"
        }
    }"#;

    #[test]
    fn test_load_local_file_and_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        std::fs::write(&path, WORD_LEVEL_JSON).unwrap();

        let tokenizer = HfTokenizer::load(path.to_str().unwrap()).unwrap();
        let ids = tokenizer.encode("hello world hello").unwrap();
        assert_eq!(ids, vec![1, 2, 1]);
        assert_eq!(tokenizer.decode(&ids[..2]).unwrap(), "hello world");
    }

    #[test]
    fn test_invalid_local_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = HfTokenizer::load(path.to_str().unwrap()).err().unwrap();
        assert!(matches!(err, TokenizerError::Load { .. }));
    }
}
