//! Builds vector store entries from chunks and embeddings and writes them.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{IndexError, VectorStoreError};
use crate::models::{
    ChunkRecord, DistanceMetric, EmbeddingOutcome, EntryPayload, FailurePolicy, IdStrategy,
    PointKey, VectorStoreConfig, VectorStoreEntry,
};
use crate::services::VectorStore;
use crate::utils::{RetryConfig, progress_bar, with_retry};

/// Entries ready for upsert, plus what happened to failed embeddings.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub entries: Vec<VectorStoreEntry>,
    /// Entries stored with a zero vector.
    pub placeholders: usize,
    /// Chunks left out because their embedding failed.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub stored: usize,
    pub placeholders: usize,
    pub skipped: usize,
}

pub struct VectorStoreWriter {
    store: Arc<dyn VectorStore>,
    collection: String,
    dimension: usize,
    upsert_batch_size: usize,
    id_strategy: IdStrategy,
    failure_policy: FailurePolicy,
    retry: RetryConfig,
    show_progress: bool,
}

impl VectorStoreWriter {
    pub fn new(store: Arc<dyn VectorStore>, config: &VectorStoreConfig, dimension: usize) -> Self {
        Self {
            store,
            collection: config.collection.clone(),
            dimension,
            upsert_batch_size: config.upsert_batch_size.max(1) as usize,
            id_strategy: config.id_strategy,
            failure_policy: config.failure_policy,
            retry: RetryConfig::default(),
            show_progress: false,
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Create the collection unless it already exists. Returns whether it was
    /// created. An existing collection of another vector size is an error.
    pub async fn ensure_collection(&self) -> Result<bool, VectorStoreError> {
        let want = self.dimension as u64;

        if let Some(info) = self.store.collection_info(&self.collection).await? {
            return match info.vector_size {
                Some(size) if size != want => Err(VectorStoreError::CollectionError(format!(
                    "collection '{}' has vector size {}, embeddings have {}",
                    self.collection, size, want
                ))),
                _ => {
                    debug!(
                        collection = %self.collection,
                        points = info.points_count,
                        "collection exists"
                    );
                    Ok(false)
                }
            };
        }

        self.store
            .create_collection(&self.collection, want, DistanceMetric::Cosine)
            .await?;
        info!(
            collection = %self.collection,
            dimension = want,
            distance = %DistanceMetric::Cosine,
            "created collection"
        );
        Ok(true)
    }

    /// Pair each chunk with its embedding outcome.
    ///
    /// `chunks` and `outcomes` must be index-aligned; a length difference or a
    /// vector of the wrong width is fatal since it means the pairing is wrong.
    pub fn build_entries(
        &self,
        chunks: &[&ChunkRecord],
        outcomes: &[EmbeddingOutcome],
    ) -> Result<WriteBatch, IndexError> {
        if chunks.len() != outcomes.len() {
            return Err(IndexError::CountMismatch {
                chunks: chunks.len(),
                embeddings: outcomes.len(),
            });
        }

        let mut batch = WriteBatch {
            entries: Vec::with_capacity(chunks.len()),
            ..Default::default()
        };

        for (position, (chunk, outcome)) in chunks.iter().zip(outcomes).enumerate() {
            let vector = match outcome {
                EmbeddingOutcome::Vector(v) if v.len() != self.dimension => {
                    return Err(IndexError::DimensionMismatch {
                        index: position,
                        got: v.len(),
                        want: self.dimension,
                    });
                }
                EmbeddingOutcome::Vector(v) => v.clone(),
                EmbeddingOutcome::Failed { .. } => match self.failure_policy {
                    FailurePolicy::Placeholder => {
                        batch.placeholders += 1;
                        vec![0.0; self.dimension]
                    }
                    FailurePolicy::Skip => {
                        batch.skipped += 1;
                        continue;
                    }
                },
            };

            batch.entries.push(VectorStoreEntry {
                id: self.point_key(position, chunk),
                vector,
                payload: EntryPayload::from(*chunk),
            });
        }

        Ok(batch)
    }

    fn point_key(&self, position: usize, chunk: &ChunkRecord) -> PointKey {
        match self.id_strategy {
            IdStrategy::Positional => PointKey::Num(position as u64),
            IdStrategy::Stable => PointKey::Uuid(chunk.stable_id()),
        }
    }

    /// Upsert entries in order, `upsert_batch_size` at a time.
    pub async fn upsert(&self, entries: Vec<VectorStoreEntry>) -> Result<usize, VectorStoreError> {
        let total = entries.len();
        let pb = progress_bar(total as u64, "storing", self.show_progress);

        for batch in entries.chunks(self.upsert_batch_size) {
            with_retry(&self.retry, || {
                self.store.upsert(&self.collection, batch.to_vec())
            })
            .await?;
            pb.inc(batch.len() as u64);
        }

        pb.finish_and_clear();
        Ok(total)
    }

    pub async fn write(
        &self,
        chunks: &[&ChunkRecord],
        outcomes: &[EmbeddingOutcome],
    ) -> Result<WriteStats, IndexError> {
        let batch = self.build_entries(chunks, outcomes)?;

        if batch.placeholders > 0 {
            warn!(
                count = batch.placeholders,
                "storing zero-vector placeholders for failed embeddings"
            );
        }
        if batch.skipped > 0 {
            warn!(count = batch.skipped, "skipping chunks with failed embeddings");
        }

        let stored = self.upsert(batch.entries).await?;
        info!(collection = %self.collection, stored, "stored embeddings");

        Ok(WriteStats {
            stored,
            placeholders: batch.placeholders,
            skipped: batch.skipped,
        })
    }
}
