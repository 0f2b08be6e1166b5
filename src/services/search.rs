//! Similarity search over a populated collection.

use std::time::Instant;

use tracing::debug;

use crate::error::{EmbeddingError, SearchError};
use crate::models::SearchResults;
use crate::services::{EmbeddingProvider, VectorStore};

/// Embed `query` and return the `limit` nearest chunks in `collection`.
pub async fn semantic_search(
    provider: &dyn EmbeddingProvider,
    store: &dyn VectorStore,
    collection: &str,
    query: &str,
    limit: u64,
) -> Result<SearchResults, SearchError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(SearchError::InvalidQuery(
            "search query cannot be empty".to_string(),
        ));
    }
    if limit == 0 {
        return Err(SearchError::InvalidQuery(
            "limit must be at least 1".to_string(),
        ));
    }

    let start_time = Instant::now();

    let vector = provider
        .embed(&[query.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))?;
    debug!(
        embed_ms = start_time.elapsed().as_millis() as u64,
        "query embedded"
    );

    let results = store.search(collection, vector, limit).await?;

    Ok(SearchResults::new(
        query.to_string(),
        collection.to_string(),
        results,
        start_time.elapsed().as_millis() as u64,
    ))
}
