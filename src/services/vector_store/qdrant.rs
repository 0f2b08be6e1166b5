//! Qdrant vector store backend implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointId, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use tracing::debug;

use super::VectorStore;
use crate::error::VectorStoreError;
use crate::models::{
    CollectionInfo, DistanceMetric, EntryPayload, PointKey, ScoredEntry, VectorStoreConfig,
    VectorStoreEntry,
};

/// Qdrant vector store backend, over gRPC.
pub struct QdrantBackend {
    client: Qdrant,
}

impl QdrantBackend {
    pub fn new(config: &VectorStoreConfig) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self { client })
    }
}

fn to_distance(metric: DistanceMetric) -> Distance {
    match metric {
        DistanceMetric::Cosine => Distance::Cosine,
    }
}

fn to_point_id(key: PointKey) -> PointId {
    match key {
        PointKey::Num(n) => n.into(),
        PointKey::Uuid(u) => u.into(),
    }
}

fn point_id_string(id: Option<&PointId>) -> String {
    match id.and_then(|id| id.point_id_options.as_ref()) {
        Some(PointIdOptions::Num(n)) => n.to_string(),
        Some(PointIdOptions::Uuid(u)) => u.clone(),
        None => String::new(),
    }
}

fn to_payload(payload: EntryPayload) -> HashMap<String, Value> {
    let mut map: HashMap<String, Value> = HashMap::new();
    map.insert("text".to_string(), payload.text.into());
    map.insert("source_file".to_string(), payload.source_file.into());
    map.insert("source_type".to_string(), payload.source_type.into());
    map.insert("file_hash".to_string(), payload.file_hash.into());
    map.insert("processed_at".to_string(), payload.processed_at.into());
    map.insert(
        "chunk_index".to_string(),
        i64::from(payload.chunk_index).into(),
    );
    map.insert(
        "token_count".to_string(),
        i64::from(payload.token_count).into(),
    );
    map.insert(
        "start_token_offset".to_string(),
        i64::from(payload.start_token_offset).into(),
    );
    map.insert(
        "end_token_offset".to_string(),
        i64::from(payload.end_token_offset).into(),
    );
    map
}

fn string_field(payload: &HashMap<String, Value>, key: &str) -> String {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::StringValue(s)) => s.clone(),
        _ => String::new(),
    }
}

fn int_field(payload: &HashMap<String, Value>, key: &str) -> u32 {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::IntegerValue(n)) => u32::try_from(*n).unwrap_or(0),
        Some(Kind::DoubleValue(d)) => *d as u32,
        _ => 0,
    }
}

fn from_payload(payload: &HashMap<String, Value>) -> EntryPayload {
    EntryPayload {
        text: string_field(payload, "text"),
        source_file: string_field(payload, "source_file"),
        source_type: string_field(payload, "source_type"),
        file_hash: string_field(payload, "file_hash"),
        processed_at: string_field(payload, "processed_at"),
        chunk_index: int_field(payload, "chunk_index"),
        token_count: int_field(payload, "token_count"),
        start_token_offset: int_field(payload, "start_token_offset"),
        end_token_offset: int_field(payload, "end_token_offset"),
    }
}

#[async_trait]
impl VectorStore for QdrantBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn collection_info(
        &self,
        name: &str,
    ) -> Result<Option<CollectionInfo>, VectorStoreError> {
        let exists = self
            .client
            .collection_exists(name)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;
        if !exists {
            return Ok(None);
        }

        let info = self
            .client
            .collection_info(name)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        let Some(result) = info.result else {
            return Ok(Some(CollectionInfo {
                points_count: 0,
                vector_size: None,
            }));
        };

        // Named-vector collections have no single size
        let vector_size = result
            .config
            .as_ref()
            .and_then(|c| c.params.as_ref())
            .and_then(|p| p.vectors_config.as_ref())
            .and_then(|v| v.config.as_ref())
            .and_then(|c| match c {
                VectorsConfigKind::Params(params) => Some(params.size),
                VectorsConfigKind::ParamsMap(_) => None,
            });

        Ok(Some(CollectionInfo {
            points_count: result.points_count.unwrap_or(0),
            vector_size,
        }))
    }

    async fn create_collection(
        &self,
        name: &str,
        dimension: u64,
        distance: DistanceMetric,
    ) -> Result<(), VectorStoreError> {
        let create_collection = CreateCollectionBuilder::new(name)
            .vectors_config(VectorParamsBuilder::new(dimension, to_distance(distance)));

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        Ok(())
    }

    async fn upsert(
        &self,
        name: &str,
        entries: Vec<VectorStoreEntry>,
    ) -> Result<(), VectorStoreError> {
        if entries.is_empty() {
            return Ok(());
        }

        let count = entries.len();
        let points: Vec<PointStruct> = entries
            .into_iter()
            .map(|entry| {
                PointStruct::new(
                    to_point_id(entry.id),
                    entry.vector,
                    to_payload(entry.payload),
                )
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(name, points).wait(true))
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        debug!(collection = name, count, "upserted points");
        Ok(())
    }

    async fn search(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<ScoredEntry>, VectorStoreError> {
        let results = self
            .client
            .search_points(SearchPointsBuilder::new(name, vector, limit).with_payload(true))
            .await
            .map_err(|e| VectorStoreError::SearchError(e.to_string()))?;

        Ok(results
            .result
            .into_iter()
            .map(|point| ScoredEntry {
                id: point_id_string(point.id.as_ref()),
                score: point.score,
                payload: from_payload(&point.payload),
            })
            .collect())
    }
}
