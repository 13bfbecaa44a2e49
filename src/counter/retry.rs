//! Retry configuration and error classification for counter persistence.

use std::io::ErrorKind;
use std::time::Duration;

use backon::ExponentialBuilder;

/// Configuration for retrying counter store writes with exponential backoff.
///
/// Writes happen while the counter lock is held, so the defaults keep the
/// worst case well under a second.
#[derive(Debug, Clone)]
pub struct PersistRetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: usize,
    /// Initial delay between retries in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for PersistRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 5,
            max_delay_ms: 100,
        }
    }
}

impl PersistRetryConfig {
    /// Disables retries; the first failure is final.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Creates a PersistRetryConfig from environment variables.
    ///
    /// Environment variables:
    /// - `CAPTIONER_PERSIST_MAX_RETRIES`: Maximum retry attempts (default: 3)
    /// - `CAPTIONER_PERSIST_RETRY_INITIAL_MS`: Initial backoff delay in ms (default: 5)
    /// - `CAPTIONER_PERSIST_RETRY_MAX_MS`: Maximum backoff delay in ms (default: 100)
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_retries: std::env::var("CAPTIONER_PERSIST_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_retries),
            initial_delay_ms: std::env::var("CAPTIONER_PERSIST_RETRY_INITIAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.initial_delay_ms),
            max_delay_ms: std::env::var("CAPTIONER_PERSIST_RETRY_MAX_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_delay_ms),
        }
    }

    /// Creates an exponential backoff builder. No jitter, so the retry
    /// schedule is deterministic.
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.initial_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_max_times(self.max_retries)
    }
}

/// Classifies store write errors as retryable or not.
///
/// Only transient conditions are retried. Permission problems, a missing
/// directory or a full disk fail immediately.
pub fn is_retryable_io_error(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
    )
}
