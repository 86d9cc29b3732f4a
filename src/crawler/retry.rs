//! Bounded retry with exponential backoff
//!
//! The policy itself knows nothing about HTTP beyond which status codes are
//! worth retrying; the transport decides per attempt whether an outcome is
//! final, retryable, or fatal.

use std::future::Future;
use std::time::Duration;

/// Status codes that are retried
pub const RETRYABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// Outcome of a single attempt
#[derive(Debug)]
pub enum Attempt<T, E> {
    /// The attempt produced a final value
    Done(T),

    /// The attempt failed transiently and may be retried
    Retry(E),

    /// The attempt failed permanently
    Abort(E),
}

/// Retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(100),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-based)
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(retry.min(16));
        self.base_backoff.saturating_mul(factor)
    }

    pub fn is_retryable_status(code: u16) -> bool {
        RETRYABLE_STATUS_CODES.contains(&code)
    }

    /// Runs `operation` until it succeeds, aborts, or attempts run out
    ///
    /// The closure receives the 0-based attempt number. When attempts are
    /// exhausted the last transient error is returned.
    pub async fn run_with_retry<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Attempt<T, E>>,
        E: std::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match operation(attempt).await {
                Attempt::Done(value) => return Ok(value),
                Attempt::Abort(err) => return Err(err),
                Attempt::Retry(err) => {
                    if attempt + 1 >= max_attempts {
                        return Err(err);
                    }

                    let delay = self.backoff_for(attempt);
                    tracing::debug!(
                        "Attempt {}/{} failed ({}), retrying in {:?}",
                        attempt + 1,
                        max_attempts,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
