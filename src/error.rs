//! Error types for the ingestion pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors related to configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Errors raised while turning a file into raw text.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("pdf extraction failed: {0}")]
    Pdf(String),

    #[error("docx extraction failed: {0}")]
    Docx(String),
}

/// Errors raised by the tokenizer adapter.
#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("failed to load tokenizer '{name}': {reason}")]
    Load { name: String, reason: String },

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding provider: {0}")]
    ConnectionError(String),

    #[error("embedding provider returned {status}: {body}")]
    ServerError {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout => true,
            EmbeddingError::ServerError { status, .. } => {
                *status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            EmbeddingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            EmbeddingError::InvalidResponse(_) => false,
        }
    }
}

/// Errors related to vector store operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to Qdrant: {0}")]
    ConnectionError(String),

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("search error: {0}")]
    SearchError(String),
}

impl Retryable for VectorStoreError {
    fn is_retryable(&self) -> bool {
        match self {
            VectorStoreError::ConnectionError(_) => true,
            VectorStoreError::CollectionError(msg)
            | VectorStoreError::UpsertError(msg)
            | VectorStoreError::SearchError(msg) => {
                let msg_lower = msg.to_lowercase();
                msg_lower.contains("timeout")
                    || msg_lower.contains("connection")
                    || msg_lower.contains("unavailable")
                    || msg_lower.contains("too many")
            }
        }
    }
}

/// Errors related to chunking and storing documents.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("directory walk error: {0}")]
    WalkError(String),

    #[error("tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    #[error("chunk/embedding count mismatch: {chunks} chunks, {embeddings} embeddings")]
    CountMismatch { chunks: usize, embeddings: usize },

    #[error("embedding {index} has dimension {got}, expected {want}")]
    DimensionMismatch {
        index: usize,
        got: usize,
        want: usize,
    },

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),
}

/// Errors related to the artifacts exchanged between stages.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("processed documents not found at {0}; run `docingest process` first")]
    Missing(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Errors related to search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStoreError(#[from] VectorStoreError),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}
