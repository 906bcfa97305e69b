//! Retry with exponential backoff
//!
//! [`RetryPolicy::run`] re-issues an operation while its error classifies as
//! retryable (see [`crate::error::is_retryable`]) and the attempt budget is not
//! spent. The delay before retry `n` (1-based) is `factor * 2^(n-1)`.

use crate::error::{is_retryable, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Exponential backoff policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_tries: u32,
    /// Base delay multiplied by powers of two
    pub factor: Duration,
    /// Upper bound for a single delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_tries: 5,
            factor: Duration::from_secs(2),
            max_backoff: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget and base delay
    pub fn new(max_tries: u32, factor: Duration) -> Self {
        Self {
            max_tries: max_tries.max(1),
            factor,
            ..Self::default()
        }
    }

    /// Policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay slept before the given retry (1 = first retry)
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        let multiplier = 2u32.saturating_pow(exponent);
        std::cmp::min(self.factor.saturating_mul(multiplier), self.max_backoff)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is exhausted. `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_tries = self.max_tries.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if !is_retryable(&e) => {
                    debug!("{} failed with non-retryable error: {}", label, e);
                    return Err(e);
                }
                Err(e) if attempt >= max_tries => {
                    warn!("{} giving up after {} attempts: {}", label, attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "{} failed: {}, attempt {}/{}, retrying in {:?}",
                        label, e, attempt, max_tries, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
