//! Embedding results and the run manifest.

use serde::{Deserialize, Serialize};

/// Result of embedding one chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingOutcome {
    Vector(Vec<f32>),
    Failed { reason: String },
}

impl EmbeddingOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, EmbeddingOutcome::Failed { .. })
    }

    pub fn as_vector(&self) -> Option<&[f32]> {
        match self {
            EmbeddingOutcome::Vector(v) => Some(v),
            EmbeddingOutcome::Failed { .. } => None,
        }
    }
}

/// Outcomes of a full `embed_all` run, index-aligned with its input.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingReport {
    pub outcomes: Vec<EmbeddingOutcome>,
    /// Batches whose single request failed and were retried item by item.
    pub failed_batches: usize,
}

impl EmbeddingReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.is_failed().then_some(i))
            .collect()
    }

    /// Plain vectors with a zero vector standing in for every failure.
    pub fn into_vectors(self, dimension: usize) -> Vec<Vec<f32>> {
        self.outcomes
            .into_iter()
            .map(|outcome| match outcome {
                EmbeddingOutcome::Vector(v) => v,
                EmbeddingOutcome::Failed { .. } => vec![0.0; dimension],
            })
            .collect()
    }
}

/// Manifest written after the embedding stage. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSummary {
    pub total_documents: usize,
    pub total_chunks: usize,
    pub embedding_model: String,
    pub collection_name: String,
    #[serde(default)]
    pub failed_embeddings: usize,
    #[serde(default)]
    pub stored_points: usize,
}
