//! Rate limiting implementation
//!
//! A hard ceiling of `limit` calls per trailing `every` window. The
//! timestamps of the last `limit` calls are kept in a bounded queue; once the
//! queue is full the next caller waits until the oldest timestamp has aged
//! out of the window. Bursts of up to `limit` calls pass without waiting.
//!
//! The queue lock is held across the wait, so a throttled caller holds the
//! gate for everyone else. No fairness is promised beyond the ceiling.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Configuration for rate limiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Maximum number of calls inside one window
    pub limit: usize,
    /// Window length
    pub every: Duration,
}

impl Default for RateLimiterConfig {
    /// ActiveCampaign allows 5 requests per second per account
    fn default() -> Self {
        Self {
            limit: 5,
            every: Duration::from_secs(1),
        }
    }
}

impl RateLimiterConfig {
    /// Create a new rate limiter config
    pub fn new(limit: usize, every: Duration) -> Self {
        Self { limit, every }
    }
}

/// Sliding-window rate limiter shared by every request issued through one client
pub struct RateLimiter {
    config: RateLimiterConfig,
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config
    pub fn new(config: RateLimiterConfig) -> Self {
        // A zero limit would never admit a call
        let config = RateLimiterConfig {
            limit: config.limit.max(1),
            every: config.every,
        };
        Self {
            window: Mutex::new(VecDeque::with_capacity(config.limit)),
            config,
        }
    }

    /// Configuration in effect
    pub fn config(&self) -> RateLimiterConfig {
        self.config
    }

    /// Wait until a call may be made, then record it.
    ///
    /// The window is only modified once the wait is over, so a caller
    /// cancelled mid-wait gives up its turn without freeing a slot.
    pub async fn acquire(&self) {
        let mut window = self.window.lock().await;

        if window.len() >= self.config.limit {
            if let Some(&oldest) = window.front() {
                let elapsed = oldest.elapsed();
                if elapsed < self.config.every {
                    let wait = self.config.every - elapsed;
                    debug!("Rate limit reached, waiting {:?}", wait);
                    tokio::time::sleep(wait).await;
                }
            }
            window.pop_front();
        }

        window.push_back(Instant::now());
    }

    /// Number of calls currently recorded in the window
    pub async fn recorded(&self) -> usize {
        self.window.lock().await.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimiterConfig::default())
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
