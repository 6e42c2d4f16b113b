//! Bounded exponential-backoff retry for collaborator calls

use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use crate::{PlumeError, Result};
use crate::config::RetryConfig;

/// Retry settings shared by the weather provider, chemical catalog and
/// remote dispersion model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Factor applied to the delay after every retry
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            multiplier: 2,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            multiplier: config.multiplier,
        }
    }
}

impl RetryPolicy {
    /// Policy that gives up after the first failure
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before retry number `retry` (0-based)
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.initial_delay
            .saturating_mul(self.multiplier.saturating_pow(retry))
    }

    /// Run `call` until it succeeds, fails with a non-retryable error, or the
    /// attempts are used up. The last error is returned.
    pub async fn run<T, F, Fut>(&self, operation: &str, call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_observed(operation, call, |_, _| {}).await
    }

    /// Like [`run`](Self::run), calling `on_retry` with the failed attempt
    /// number (1-based) and its error before each backoff sleep.
    pub async fn run_observed<T, F, Fut, R>(
        &self,
        operation: &str,
        mut call: F,
        mut on_retry: R,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        R: FnMut(u32, &PlumeError),
    {
        let max_attempts = self.max_attempts();
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            debug!("{} attempt {}/{}", operation, attempt + 1, max_attempts);

            match call().await {
                Ok(value) => {
                    if attempt > 0 {
                        info!(
                            "{} succeeded on attempt {} after {:.3}s",
                            operation,
                            attempt + 1,
                            started.elapsed().as_secs_f64()
                        );
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_retryable() => {
                    warn!("{} failed with non-retryable error: {}", operation, e);
                    return Err(e);
                }
                Err(e) if attempt + 1 >= max_attempts => {
                    error!("{} failed after {} attempts: {}", operation, max_attempts, e);
                    return Err(e);
                }
                Err(e) => {
                    on_retry(attempt + 1, &e);
                    let backoff = self.delay_for(attempt);
                    warn!(
                        "{} failed on attempt {}: {}; retrying in {:.1}s",
                        operation,
                        attempt + 1,
                        e,
                        backoff.as_secs_f64()
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}
