//! Backoff policy for provider calls
//!
//! 재시도는 provider 계층에서 끝난다. Executor는 실패를 그대로 기록한다.

use crate::error::ProviderError;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Backoff settings for [`with_retry`]
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts allowed after the first one
    pub max_retries: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Growth factor applied per attempt
    pub backoff_multiplier: f64,

    /// Ceiling on any single delay
    pub max_delay: Duration,

    /// Randomize each delay by +-20% so concurrent tasks fan out
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let grown = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let capped = grown.min(self.max_delay.as_millis() as f64);

        let millis = if self.jitter {
            capped * (0.8 + rand::random::<f64>() * 0.4)
        } else {
            capped
        };
        Duration::from_millis(millis as u64)
    }
}

/// Run `operation` until it succeeds, fails permanently, or the retry budget
/// is spent. Rate-limit errors that carry a server-requested wait use that
/// wait instead of the computed backoff.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_transient() {
            debug!("{}: permanent error: {}", operation_name, err);
            return Err(err);
        }

        if attempt >= config.max_retries {
            warn!(
                "{}: giving up after {} attempts: {}",
                operation_name,
                attempt + 1,
                err
            );
            return Err(err);
        }

        let delay = err
            .retry_after()
            .unwrap_or_else(|| config.delay_for_attempt(attempt));
        warn!(
            "{}: attempt {} failed ({}), next try in {:?}",
            operation_name,
            attempt + 1,
            err,
            delay
        );

        sleep(delay).await;
        attempt += 1;
    }
}
