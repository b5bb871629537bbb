//! Retry logic with exponential backoff for outbound exchange requests.

use std::future::Future;
use std::time::Duration;

use crate::error::ExchangeError;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Wait before the first retry; doubles on each subsequent retry.
    pub base_delay: Duration,
    /// Upper bound on the wait between attempts.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// Read overrides from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_attempts = std::env::var("RETRY_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_attempts);

        let base_delay = std::env::var("RETRY_BASE_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.base_delay);

        let max_delay = std::env::var("RETRY_MAX_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.max_delay);

        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }
}

/// Execute a request with automatic retry on transport failures.
///
/// Only errors for which [`ExchangeError::is_retryable`] holds (transport and
/// status failures) trigger a retry; validation, vendor and decode errors are
/// returned immediately. After the attempt budget is exhausted, the last
/// transport error propagates to the caller.
pub async fn execute_with_retry<F, Fut, T>(
    config: &RetryConfig,
    mut request_fn: F,
) -> Result<T, ExchangeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ExchangeError>>,
{
    let mut delay = config.base_delay;

    for attempt in 1..=config.max_attempts {
        match request_fn().await {
            Ok(data) => return Ok(data),
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                tracing::warn!(
                    "request failed (attempt {}/{}), retrying in {:?}: {}",
                    attempt,
                    config.max_attempts,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, config.max_delay);
            }
            Err(e) => return Err(e),
        }
    }

    Err(ExchangeError::Internal(
        "retry loop exhausted without returning".to_string(),
    ))
}
