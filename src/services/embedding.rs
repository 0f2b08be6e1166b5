//! Embedding provider for generating text embeddings.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

/// Turns a batch of texts into vectors, one per input, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Model identifier recorded in the run summary.
    fn model(&self) -> &str;
}

/// Request body for the `/embeddings` endpoint.
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Client for OpenAI-compatible embedding endpoints (OpenAI, OpenRouter).
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingClient {
    client: Client,
    endpoint: String,
    model: String,
}

impl OpenAiEmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {
                let value = HeaderValue::from_str(&format!("Bearer {key}"))
                    .map_err(|e| EmbeddingError::ConnectionError(format!("invalid API key: {e}")))?;
                headers.insert(AUTHORIZATION, value);
            }
            _ => {
                return Err(EmbeddingError::ConnectionError(
                    "no API key configured (set OPENROUTER_API_KEY or embedding.api_key)"
                        .to_string(),
                ));
            }
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else if e.is_connect() {
                    EmbeddingError::ConnectionError(e.to_string())
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError { status, body });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        Ok(into_ordered_vectors(parsed))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Providers may answer out of order; `index` is authoritative.
fn into_ordered_vectors(mut response: EmbeddingResponse) -> Vec<Vec<f32>> {
    response.data.sort_by_key(|entry| entry.index);
    response
        .data
        .into_iter()
        .map(|entry| entry.embedding)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key() -> EmbeddingConfig {
        EmbeddingConfig {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_client_creation() {
        let client = OpenAiEmbeddingClient::new(&config_with_key()).unwrap();
        assert_eq!(client.model(), "openai/text-embedding-3-small");
        assert_eq!(client.endpoint(), "https://openrouter.ai/api/v1/embeddings");
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let config = EmbeddingConfig::default();
        assert!(matches!(
            OpenAiEmbeddingClient::new(&config),
            Err(EmbeddingError::ConnectionError(_))
        ));

        let blank = EmbeddingConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(OpenAiEmbeddingClient::new(&blank).is_err());
    }

    #[test]
    fn test_base_url_trimming() {
        let config = EmbeddingConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..config_with_key()
        };
        let client = OpenAiEmbeddingClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/embeddings");
    }

    #[test]
    fn test_request_shape() {
        let input = vec!["a".to_string(), "b".to_string()];
        let request = EmbeddingRequest {
            model: "m",
            input: &input,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, serde_json::json!({ "model": "m", "input": ["a", "b"] }));
    }

    #[test]
    fn test_response_sorted_by_index() {
        let body = r#"{
            "object": "list",
            "data": [
                { "object": "embedding", "index": 1, "embedding": [0.5, 0.5] },
                { "object": "embedding", "index": 0, "embedding": [1.0, 0.0] }
            ],
            "model": "m",
            "usage": { "prompt_tokens": 2, "total_tokens": 2 }
        }"#;
        let parsed: EmbeddingResponse = serde_json::from_str(body).unwrap();
        let vectors = into_ordered_vectors(parsed);
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.5, 0.5]]);
    }
}
