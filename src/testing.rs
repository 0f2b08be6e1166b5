//! In-process fakes for the tokenizer, embedding provider and vector store.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{EmbeddingError, TokenizerError, VectorStoreError};
use crate::models::{CollectionInfo, DistanceMetric, ScoredEntry, VectorStoreEntry};
use crate::services::{EmbeddingProvider, TokenCodec, VectorStore};

/// One token per Unicode scalar value.
pub struct CharCodec;

impl TokenCodec for CharCodec {
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        Ok(text.chars().map(u32::from).collect())
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError> {
        tokens
            .iter()
            .map(|&t| {
                char::from_u32(t).ok_or_else(|| TokenizerError::Decode(format!("bad token {t}")))
            })
            .collect()
    }
}

/// Deterministic provider whose failures are keyed on input text.
pub struct ScriptedProvider {
    dimension: usize,
    /// Multi-text requests containing any of these fail.
    failing_batches: HashSet<String>,
    /// Single-text requests for these fail.
    failing_items: HashSet<String>,
    /// Multi-text requests return one vector too few.
    truncate_batches: bool,
    /// Texts whose vector comes back one element short.
    short_vectors: HashSet<String>,
    calls: Mutex<Vec<usize>>,
}

impl ScriptedProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            failing_batches: HashSet::new(),
            failing_items: HashSet::new(),
            truncate_batches: false,
            short_vectors: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_batch_containing(mut self, text: &str) -> Self {
        self.failing_batches.insert(text.to_string());
        self
    }

    pub fn fail_item(mut self, text: &str) -> Self {
        self.failing_items.insert(text.to_string());
        self
    }

    pub fn truncate_batches(mut self) -> Self {
        self.truncate_batches = true;
        self
    }

    pub fn short_vector_for(mut self, text: &str) -> Self {
        self.short_vectors.insert(text.to_string());
        self
    }

    /// Sizes of every request received, in order.
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.25; self.dimension];
        if let Some(first) = vector.first_mut() {
            *first = text.chars().count() as f32 + 1.0;
        }
        if self.short_vectors.contains(text) {
            vector.pop();
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.lock().unwrap().push(texts.len());

        if texts.len() > 1 && texts.iter().any(|t| self.failing_batches.contains(t)) {
            return Err(EmbeddingError::InvalidResponse("scripted batch failure".into()));
        }
        if texts.len() == 1 && self.failing_items.contains(&texts[0]) {
            return Err(EmbeddingError::InvalidResponse("scripted item failure".into()));
        }

        let mut vectors: Vec<Vec<f32>> = texts.iter().map(|t| self.vector_for(t)).collect();
        if self.truncate_batches && texts.len() > 1 {
            vectors.pop();
        }
        Ok(vectors)
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
struct Collection {
    dimension: u64,
    points: Vec<VectorStoreEntry>,
}

/// Vector store kept in memory, with brute-force cosine search.
#[derive(Default)]
pub struct InMemoryStore {
    collections: Mutex<HashMap<String, Collection>>,
    creates: AtomicUsize,
    upsert_sizes: Mutex<Vec<usize>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(self, name: &str, dimension: u64) -> Self {
        self.collections.lock().unwrap().insert(
            name.to_string(),
            Collection {
                dimension,
                points: Vec::new(),
            },
        );
        self
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn upsert_sizes(&self) -> Vec<usize> {
        self.upsert_sizes.lock().unwrap().clone()
    }

    pub fn points(&self, name: &str) -> Vec<VectorStoreEntry> {
        self.collections
            .lock()
            .unwrap()
            .get(name)
            .map(|c| c.points.clone())
            .unwrap_or_default()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        Ok(true)
    }

    async fn collection_info(
        &self,
        name: &str,
    ) -> Result<Option<CollectionInfo>, VectorStoreError> {
        Ok(self.collections.lock().unwrap().get(name).map(|c| CollectionInfo {
            points_count: c.points.len() as u64,
            vector_size: Some(c.dimension),
        }))
    }

    async fn create_collection(
        &self,
        name: &str,
        dimension: u64,
        _distance: DistanceMetric,
    ) -> Result<(), VectorStoreError> {
        let mut collections = self.collections.lock().unwrap();
        if collections.contains_key(name) {
            return Err(VectorStoreError::CollectionError(format!(
                "collection {name} already exists"
            )));
        }
        collections.insert(
            name.to_string(),
            Collection {
                dimension,
                points: Vec::new(),
            },
        );
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert(
        &self,
        name: &str,
        entries: Vec<VectorStoreEntry>,
    ) -> Result<(), VectorStoreError> {
        let mut collections = self.collections.lock().unwrap();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| VectorStoreError::UpsertError(format!("no collection {name}")))?;

        self.upsert_sizes.lock().unwrap().push(entries.len());
        for entry in entries {
            if entry.vector.len() as u64 != collection.dimension {
                return Err(VectorStoreError::UpsertError("wrong vector size".into()));
            }
            match collection.points.iter_mut().find(|p| p.id == entry.id) {
                Some(existing) => *existing = entry,
                None => collection.points.push(entry),
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<ScoredEntry>, VectorStoreError> {
        let collections = self.collections.lock().unwrap();
        let collection = collections
            .get(name)
            .ok_or_else(|| VectorStoreError::SearchError(format!("no collection {name}")))?;

        let mut hits: Vec<ScoredEntry> = collection
            .points
            .iter()
            .map(|p| ScoredEntry {
                id: p.id.to_string(),
                score: cosine(&p.vector, &vector),
                payload: p.payload.clone(),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit as usize);
        Ok(hits)
    }
}
