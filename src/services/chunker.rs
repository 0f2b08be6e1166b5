//! Token-window chunking with overlap.

use std::sync::Arc;

use tracing::debug;

use crate::error::{ConfigError, TokenizerError};
use crate::models::{ChunkRecord, ChunkingConfig, DocumentMetadata};
use crate::services::TokenCodec;

/// Splits text into fixed-size token windows that overlap by a fixed amount.
///
/// Windows are decoded independently, so boundaries are token positions and
/// never character or byte offsets.
#[derive(Clone)]
pub struct TextChunker {
    tokenizer: Arc<dyn TokenCodec>,
    chunk_size: usize,
    overlap: usize,
}

impl std::fmt::Debug for TextChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextChunker")
            .field("chunk_size", &self.chunk_size)
            .field("overlap", &self.overlap)
            .finish_non_exhaustive()
    }
}

impl TextChunker {
    /// Build a chunker, rejecting configurations where the window would not
    /// advance (`chunk_overlap >= chunk_size`).
    pub fn new(config: &ChunkingConfig, tokenizer: Arc<dyn TokenCodec>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tokenizer,
            chunk_size: config.chunk_size as usize,
            overlap: config.chunk_overlap as usize,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk `text`, attaching `metadata` to every emitted record.
    pub fn chunk(
        &self,
        text: &str,
        metadata: &DocumentMetadata,
    ) -> Result<Vec<ChunkRecord>, TokenizerError> {
        let tokens = self.tokenizer.encode(text)?;
        let mut chunks = Vec::new();

        for (start, end) in self.windows(tokens.len()) {
            let decoded = self.tokenizer.decode(&tokens[start..end])?;
            let trimmed = decoded.trim();
            if trimmed.is_empty() {
                debug!(start, end, "dropping blank window");
                continue;
            }

            chunks.push(ChunkRecord::new(
                trimmed.to_string(),
                metadata,
                chunks.len() as u32,
                start as u32,
                end as u32,
            ));
        }

        Ok(chunks)
    }

    /// `[start, end)` token ranges covering `len` tokens.
    ///
    /// Each window starts `chunk_size - overlap` after the previous one and
    /// the sequence stops at the first window that reaches `len`.
    pub fn windows(&self, len: usize) -> Vec<(usize, usize)> {
        let mut windows = Vec::new();
        let mut start = 0;

        while start < len {
            let end = (start + self.chunk_size).min(len);
            windows.push((start, end));
            if end == len {
                break;
            }
            start = end - self.overlap;
        }

        windows
    }
}
