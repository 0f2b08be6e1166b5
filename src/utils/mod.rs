//! Utility modules.

pub mod file;
pub mod progress;
pub mod retry;

pub use file::{hash_bytes, hash_file, hash_reader};
pub use progress::progress_bar;
pub use retry::{RetryConfig, Retryable, with_retry};
