//! Vector store entries and search hits.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::document::ChunkRecord;

/// Similarity metric of a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::Cosine => write!(f, "cosine"),
        }
    }
}

/// Existing collection as reported by the vector store.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionInfo {
    pub points_count: u64,
    /// `None` when the store cannot report a single vector size.
    pub vector_size: Option<u64>,
}

/// Point identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointKey {
    Num(u64),
    Uuid(String),
}

impl fmt::Display for PointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointKey::Num(n) => write!(f, "{n}"),
            PointKey::Uuid(u) => write!(f, "{u}"),
        }
    }
}

/// Payload stored next to each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPayload {
    pub text: String,
    pub source_file: String,
    pub source_type: String,
    pub file_hash: String,
    pub processed_at: String,
    pub chunk_index: u32,
    pub token_count: u32,
    pub start_token_offset: u32,
    pub end_token_offset: u32,
}

impl From<&ChunkRecord> for EntryPayload {
    fn from(chunk: &ChunkRecord) -> Self {
        let meta = &chunk.metadata;
        Self {
            text: chunk.text.clone(),
            source_file: meta.document.source_file.clone(),
            source_type: meta.document.source_type.clone(),
            file_hash: meta.document.file_hash.clone(),
            processed_at: meta.document.processed_at.to_rfc3339(),
            chunk_index: meta.chunk_index,
            token_count: meta.token_count,
            start_token_offset: meta.start_token_offset,
            end_token_offset: meta.end_token_offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorStoreEntry {
    pub id: PointKey,
    pub vector: Vec<f32>,
    pub payload: EntryPayload,
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntry {
    pub id: String,
    pub score: f32,
    pub payload: EntryPayload,
}
