//! Vector store abstraction layer.
//!
//! The pipeline only needs a narrow slice of a vector database: inspect a
//! collection, create it, upsert points and run a similarity query. Backends
//! implement [`VectorStore`] so the writer and the search command can be
//! exercised against an in-memory store in tests.

mod qdrant;

pub use qdrant::QdrantBackend;

use async_trait::async_trait;

use crate::error::VectorStoreError;
use crate::models::{CollectionInfo, DistanceMetric, ScoredEntry, VectorStoreConfig, VectorStoreEntry};

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Check if the vector store is reachable.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// Returns `None` if the collection doesn't exist.
    async fn collection_info(&self, name: &str)
    -> Result<Option<CollectionInfo>, VectorStoreError>;

    async fn create_collection(
        &self,
        name: &str,
        dimension: u64,
        distance: DistanceMetric,
    ) -> Result<(), VectorStoreError>;

    /// Insert or replace points by id.
    async fn upsert(
        &self,
        name: &str,
        entries: Vec<VectorStoreEntry>,
    ) -> Result<(), VectorStoreError>;

    /// Nearest neighbours of `vector`, best first.
    async fn search(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<ScoredEntry>, VectorStoreError>;
}

/// Create the configured vector store backend.
pub fn create_backend(config: &VectorStoreConfig) -> Result<Box<dyn VectorStore>, VectorStoreError> {
    Ok(Box::new(QdrantBackend::new(config)?))
}
