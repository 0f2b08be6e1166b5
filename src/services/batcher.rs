//! Batched embedding with per-item fallback.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::models::{EmbeddingConfig, EmbeddingOutcome, EmbeddingReport};
use crate::services::EmbeddingProvider;
use crate::utils::{RetryConfig, progress_bar, with_retry};

/// Drives an [`EmbeddingProvider`] over an arbitrary number of texts.
///
/// Texts are sent in contiguous batches. A batch that fails as a whole is
/// retried one text at a time, and a text that still fails is recorded as
/// [`EmbeddingOutcome::Failed`]. The returned report always has one outcome
/// per input, in input order.
pub struct EmbeddingBatcher {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    dimension: usize,
    batch_delay: Duration,
    retry: RetryConfig,
    show_progress: bool,
}

impl EmbeddingBatcher {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: &EmbeddingConfig) -> Self {
        Self {
            provider,
            batch_size: config.batch_size.max(1) as usize,
            dimension: config.dimension as usize,
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            retry: RetryConfig::from(config),
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

    pub async fn embed_all(&self, texts: &[String]) -> EmbeddingReport {
        let mut report = EmbeddingReport {
            outcomes: Vec::with_capacity(texts.len()),
            failed_batches: 0,
        };
        if texts.is_empty() {
            return report;
        }

        let total_batches = texts.len().div_ceil(self.batch_size);
        info!(
            texts = texts.len(),
            batches = total_batches,
            model = self.provider.model(),
            "generating embeddings"
        );

        let pb = progress_bar(texts.len() as u64, "embedding", self.show_progress);

        for (batch_no, batch) in texts.chunks(self.batch_size).enumerate() {
            match self.embed_batch(batch).await {
                Ok(vectors) => {
                    debug!(batch = batch_no + 1, size = batch.len(), "batch embedded");
                    report
                        .outcomes
                        .extend(vectors.into_iter().map(|v| self.check_dimension(v)));
                    if !self.batch_delay.is_zero() {
                        sleep(self.batch_delay).await;
                    }
                }
                Err(reason) => {
                    warn!(
                        batch = batch_no + 1,
                        size = batch.len(),
                        %reason,
                        "batch failed, embedding items individually"
                    );
                    report.failed_batches += 1;
                    for text in batch {
                        report.outcomes.push(self.embed_one(text).await);
                    }
                }
            }
            pb.inc(batch.len() as u64);
        }

        pb.finish_and_clear();

        let failed = report.failed_count();
        if failed > 0 {
            warn!(failed, total = report.len(), "some chunks could not be embedded");
        }

        report
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, String> {
        let vectors = with_retry(&self.retry, || self.provider.embed(batch))
            .await
            .map_err(|e| e.to_string())?;

        if vectors.len() != batch.len() {
            return Err(format!(
                "provider returned {} embeddings for {} inputs",
                vectors.len(),
                batch.len()
            ));
        }
        Ok(vectors)
    }

    async fn embed_one(&self, text: &str) -> EmbeddingOutcome {
        let single = [text.to_string()];
        match with_retry(&self.retry, || self.provider.embed(&single)).await {
            Ok(mut vectors) if vectors.len() == 1 => self.check_dimension(vectors.remove(0)),
            Ok(vectors) => EmbeddingOutcome::Failed {
                reason: format!("provider returned {} embeddings for 1 input", vectors.len()),
            },
            Err(e) => {
                debug!(error = %e, "item embedding failed");
                EmbeddingOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn check_dimension(&self, vector: Vec<f32>) -> EmbeddingOutcome {
        if vector.len() == self.dimension {
            EmbeddingOutcome::Vector(vector)
        } else {
            EmbeddingOutcome::Failed {
                reason: format!(
                    "embedding has dimension {}, expected {}",
                    vector.len(),
                    self.dimension
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;

    const DIM: usize = 4;

    fn config(batch_size: u32) -> EmbeddingConfig {
        EmbeddingConfig {
            dimension: DIM as u32,
            batch_size,
            batch_delay_ms: 0,
            ..Default::default()
        }
    }

    fn texts(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn batcher(provider: Arc<ScriptedProvider>, batch_size: u32) -> EmbeddingBatcher {
        EmbeddingBatcher::new(provider, &config(batch_size)).with_retry(RetryConfig::none())
    }

    #[tokio::test]
    async fn test_failed_batch_falls_back_to_items() {
        let provider = Arc::new(
            ScriptedProvider::new(DIM)
                .fail_batch_containing("a")
                .fail_item("b"),
        );
        let report = batcher(provider.clone(), 3)
            .embed_all(&texts(&["a", "b", "c"]))
            .await;

        assert_eq!(report.len(), 3);
        assert_eq!(report.failed_batches, 1);
        assert_eq!(report.failed_indices(), vec![1]);
        assert_eq!(provider.calls(), vec![3, 1, 1, 1]);

        let vectors = report.into_vectors(DIM);
        assert_eq!(vectors[0], provider.vector_for("a"));
        assert_eq!(vectors[1], vec![0.0; DIM]);
        assert_eq!(vectors[2], provider.vector_for("c"));
    }

    #[tokio::test]
    async fn test_length_and_order_preserved() {
        let names: Vec<String> = (0..23).map(|i| format!("text-{i:02}")).collect();
        let provider = Arc::new(
            ScriptedProvider::new(DIM)
                .fail_batch_containing("text-07")
                .fail_item("text-05")
                .fail_item("text-22"),
        );
        let report = batcher(provider.clone(), 5).embed_all(&names).await;

        assert_eq!(report.len(), names.len());
        // Only batch 2 (texts 5..10) fell back; text-22 was part of a good batch
        assert_eq!(report.failed_indices(), vec![5]);
        for (name, outcome) in names.iter().zip(&report.outcomes) {
            if let Some(vector) = outcome.as_vector() {
                assert_eq!(vector, provider.vector_for(name).as_slice());
            }
        }
        assert_eq!(provider.calls(), vec![5, 5, 1, 1, 1, 1, 1, 5, 5, 3]);
    }

    #[tokio::test]
    async fn test_short_response_is_batch_failure() {
        let provider = Arc::new(ScriptedProvider::new(DIM).truncate_batches());
        let report = batcher(provider.clone(), 2)
            .embed_all(&texts(&["x", "y", "z"]))
            .await;

        assert_eq!(report.len(), 3);
        assert_eq!(report.failed_batches, 1);
        assert_eq!(report.failed_count(), 0);
        assert_eq!(provider.calls(), vec![2, 1, 1, 1]);
    }

    #[tokio::test]
    async fn test_wrong_dimension_fails_only_that_item() {
        let provider = Arc::new(ScriptedProvider::new(DIM).short_vector_for("bad"));
        let report = batcher(provider, 10)
            .embed_all(&texts(&["ok", "bad", "fine"]))
            .await;

        assert_eq!(report.failed_batches, 0);
        assert_eq!(report.failed_indices(), vec![1]);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let provider = Arc::new(ScriptedProvider::new(DIM));
        let report = batcher(provider.clone(), 10).embed_all(&[]).await;
        assert!(report.is_empty());
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_all_items_failing_still_returns_every_outcome() {
        let provider = Arc::new(
            ScriptedProvider::new(DIM)
                .fail_batch_containing("p")
                .fail_item("p")
                .fail_item("q"),
        );
        let report = batcher(provider, 2).embed_all(&texts(&["p", "q"])).await;
        assert_eq!(report.len(), 2);
        assert_eq!(report.failed_count(), 2);
        assert!(report.outcomes.iter().all(EmbeddingOutcome::is_failed));
    }
}
