//! Retry with exponential backoff for transient provider errors.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::models::EmbeddingConfig;

/// Backoff settings for one remote call.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Calls are never retried: one attempt, fail immediately.
    #[must_use]
    pub fn none() -> Self {
        Self::new(1)
    }
}

impl From<&EmbeddingConfig> for RetryConfig {
    fn from(config: &EmbeddingConfig) -> Self {
        Self::new(config.max_retries)
    }
}

/// Determines if an error is worth another attempt.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Run `operation` until it succeeds, returns a non-retryable error, or the
/// attempt budget is spent. The last error is returned as-is.
pub async fn with_retry<T, E, F, Fut>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= config.max_attempts || !error.is_retryable() {
                    return Err(error);
                }

                debug!(attempt, delay_ms = delay.as_millis() as u64, %error, "retrying");
                sleep(delay).await;

                delay = Duration::from_secs_f64(delay.as_secs_f64() * config.multiplier)
                    .min(config.max_delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct TestError(&'static str);

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            self.0.contains("transient")
        }
    }

    fn fast(attempts: u32) -> RetryConfig {
        RetryConfig::new(attempts).with_initial_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_success_after_transient_errors() {
        let counter = AtomicU32::new(0);
        let result = with_retry(&fast(3), || async {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(TestError("transient"))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let counter = AtomicU32::new(0);
        let result = with_retry(&fast(5), || async {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(TestError("bad request"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempt_budget_respected() {
        let counter = AtomicU32::new(0);
        let result = with_retry(&fast(2), || async {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(TestError("transient"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryConfig::new(0).max_attempts, 1);
        assert_eq!(RetryConfig::none().max_attempts, 1);
    }
}
