//! Stage two: chunk records to stored vectors.

use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::error::IndexError;
use crate::models::{DocumentRecord, EmbeddingSummary, flatten_chunks};
use crate::services::{EmbeddingBatcher, VectorStoreWriter};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmbedStats {
    pub documents: usize,
    pub chunks: usize,
    pub failed_embeddings: usize,
    pub failed_batches: usize,
    pub stored: usize,
    pub placeholders: usize,
    pub skipped: usize,
    pub collection_created: bool,
    pub duration_ms: u64,
}

impl EmbedStats {
    pub fn summary(&self, model: &str, collection: &str) -> EmbeddingSummary {
        EmbeddingSummary {
            total_documents: self.documents,
            total_chunks: self.chunks,
            embedding_model: model.to_string(),
            collection_name: collection.to_string(),
            failed_embeddings: self.failed_embeddings,
            stored_points: self.stored,
        }
    }
}

/// Ensure the collection, embed every chunk of `documents` in document and
/// chunk order, and store the results.
pub async fn embed_and_store(
    documents: &[DocumentRecord],
    batcher: &EmbeddingBatcher,
    writer: &VectorStoreWriter,
) -> Result<EmbedStats, IndexError> {
    let start_time = Instant::now();

    let collection_created = writer.ensure_collection().await?;

    let chunks = flatten_chunks(documents);
    info!(
        documents = documents.len(),
        chunks = chunks.len(),
        collection = writer.collection(),
        "embedding documents"
    );

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let report = batcher.embed_all(&texts).await;
    let write_stats = writer.write(&chunks, &report.outcomes).await?;

    Ok(EmbedStats {
        documents: documents.len(),
        chunks: chunks.len(),
        failed_embeddings: report.failed_count(),
        failed_batches: report.failed_batches,
        stored: write_stats.stored,
        placeholders: write_stats.placeholders,
        skipped: write_stats.skipped,
        collection_created,
        duration_ms: start_time.elapsed().as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models::{
        ChunkRecord, DocumentMetadata, EmbeddingConfig, PointKey, VectorStoreConfig,
    };
    use crate::testing::{InMemoryStore, ScriptedProvider};
    use crate::utils::RetryConfig;

    const DIM: usize = 4;

    fn document(name: &str, texts: &[&str]) -> DocumentRecord {
        let meta = DocumentMetadata {
            source_file: name.to_string(),
            source_type: "txt".to_string(),
            file_hash: "9".repeat(64),
            processed_at: chrono::Utc::now(),
        };
        let chunks = texts
            .iter()
            .enumerate()
            .map(|(i, t)| ChunkRecord::new(t.to_string(), &meta, i as u32, 0, 1))
            .collect();
        DocumentRecord::new(&meta, "", chunks)
    }

    fn setup(provider: ScriptedProvider) -> (EmbeddingBatcher, VectorStoreWriter, Arc<InMemoryStore>) {
        let embedding = EmbeddingConfig {
            dimension: DIM as u32,
            batch_size: 2,
            batch_delay_ms: 0,
            ..Default::default()
        };
        let store = Arc::new(InMemoryStore::new());
        let batcher = EmbeddingBatcher::new(Arc::new(provider), &embedding)
            .with_retry(RetryConfig::none());
        let writer = VectorStoreWriter::new(store.clone(), &VectorStoreConfig::default(), DIM)
            .with_retry(RetryConfig::none());
        (batcher, writer, store)
    }

    #[tokio::test]
    async fn test_degraded_run_stores_every_chunk() {
        let (batcher, writer, store) = setup(
            ScriptedProvider::new(DIM)
                .fail_batch_containing("a2")
                .fail_item("a2"),
        );
        let docs = vec![document("a.txt", &["a0", "a1", "a2"]), document("b.txt", &["b0"])];

        let stats = embed_and_store(&docs, &batcher, &writer).await.unwrap();

        assert!(stats.collection_created);
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.chunks, 4);
        assert_eq!(stats.failed_embeddings, 1);
        assert_eq!(stats.failed_batches, 1);
        assert_eq!(stats.stored, 4);
        assert_eq!(stats.placeholders, 1);

        let points = store.points("knowledge_base");
        let placeholder = points.iter().find(|p| p.id == PointKey::Num(2)).unwrap();
        assert_eq!(placeholder.payload.text, "a2");
        assert!(placeholder.vector.iter().all(|v| *v == 0.0));
        let last = points.iter().find(|p| p.id == PointKey::Num(3)).unwrap();
        assert_eq!(last.payload.source_file, "b.txt");

        let summary = stats.summary("scripted", writer.collection());
        assert_eq!(summary.total_chunks, 4);
        assert_eq!(summary.failed_embeddings, 1);
        assert_eq!(summary.stored_points, 4);
    }

    #[tokio::test]
    async fn test_no_documents_still_ensures_collection() {
        let (batcher, writer, store) = setup(ScriptedProvider::new(DIM));
        let stats = embed_and_store(&[], &batcher, &writer).await.unwrap();
        assert_eq!(stats.stored, 0);
        assert_eq!(store.creates(), 1);
    }
}
