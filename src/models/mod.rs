mod config;
mod document;
mod embedding;
mod entry;
mod format;
mod search;

pub use config::{
    ChunkingConfig, Config, DEFAULT_COLLECTION, DEFAULT_EMBEDDING_DIMENSION,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_URL, DEFAULT_QDRANT_URL, DEFAULT_TOKENIZER,
    DocumentsConfig, EmbeddingConfig, FailurePolicy, IdStrategy, ResolvedConfig, SearchConfig,
    VectorStoreConfig,
};
pub use document::{ChunkMetadata, ChunkRecord, DocumentMetadata, DocumentRecord, flatten_chunks};
pub use embedding::{EmbeddingOutcome, EmbeddingReport, EmbeddingSummary};
pub use entry::{
    CollectionInfo, DistanceMetric, EntryPayload, PointKey, ScoredEntry, VectorStoreEntry,
};
pub use format::{DocumentFormat, SourceFile};
pub use search::{OutputFormat, SearchResults};
