pub mod artifact;
mod batcher;
mod chunker;
mod embedding;
mod extractor;
mod indexer;
mod pipeline;
mod search;
mod tokenizer;
mod vector_store;
mod writer;

pub use batcher::EmbeddingBatcher;
pub use chunker::TextChunker;
pub use embedding::{EmbeddingProvider, OpenAiEmbeddingClient};
pub use extractor::{FormatExtractor, TextExtractor, extract_markdown};
pub use indexer::{EmbedStats, embed_and_store};
pub use pipeline::{DocumentPipeline, ProcessOutcome, ProcessStats, SkipReason};
pub use search::semantic_search;
pub use tokenizer::{HfTokenizer, TokenCodec};
pub use vector_store::{QdrantBackend, VectorStore, create_backend};
pub use writer::{VectorStoreWriter, WriteBatch, WriteStats};
