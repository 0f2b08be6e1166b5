use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance shared by every chunk of one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source_file: String,
    pub source_type: String,
    pub file_hash: String,
    pub processed_at: DateTime<Utc>,
}

/// Per-chunk metadata. Document fields are flattened into the same object.
///
/// `chunk_index` counts emitted chunks only: windows that decode to
/// whitespace are dropped without consuming an index, so consecutive indices
/// do not imply adjacent token windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(flatten)]
    pub document: DocumentMetadata,
    pub chunk_index: u32,
    pub token_count: u32,
    pub start_token_offset: u32,
    pub end_token_offset: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub text: String,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub source_file: String,
    pub file_hash: String,
    pub chunk_count: u32,
    pub total_chars: u64,
    pub chunks: Vec<ChunkRecord>,
    pub processed_at: DateTime<Utc>,
}

impl ChunkRecord {
    pub fn new(
        text: String,
        document: &DocumentMetadata,
        chunk_index: u32,
        start_token_offset: u32,
        end_token_offset: u32,
    ) -> Self {
        Self {
            text,
            metadata: ChunkMetadata {
                document: document.clone(),
                chunk_index,
                token_count: end_token_offset - start_token_offset,
                start_token_offset,
                end_token_offset,
            },
        }
    }

    /// Deterministic identity of this chunk across runs.
    pub fn stable_id(&self) -> String {
        use uuid::Uuid;
        let name = format!(
            "{}:{}:{}",
            self.metadata.document.source_file,
            self.metadata.chunk_index,
            self.metadata.document.file_hash
        );
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }
}

impl DocumentRecord {
    pub fn new(metadata: &DocumentMetadata, text: &str, chunks: Vec<ChunkRecord>) -> Self {
        Self {
            source_file: metadata.source_file.clone(),
            file_hash: metadata.file_hash.clone(),
            chunk_count: chunks.len() as u32,
            total_chars: text.chars().count() as u64,
            chunks,
            processed_at: Utc::now(),
        }
    }
}

/// Flatten documents into one chunk sequence, preserving document order and
/// chunk order within each document.
pub fn flatten_chunks(documents: &[DocumentRecord]) -> Vec<&ChunkRecord> {
    documents.iter().flat_map(|doc| doc.chunks.iter()).collect()
}
