//! Request spacing for the XML API
//!
//! The API throttles clients that send bursts of requests. Every outgoing request
//! goes through one [`RateLimiter`], which keeps the start of two consecutive
//! requests at least `60 / requests_per_minute` seconds apart across all tasks
//! sharing it.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::config::DEFAULT_REQUESTS_PER_MINUTE;

/// Serializes outgoing requests to a requests-per-minute budget
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing `requests_per_minute` requests.
    ///
    /// Zero is not a usable budget and falls back to
    /// [`DEFAULT_REQUESTS_PER_MINUTE`].
    pub fn new(requests_per_minute: u32) -> Self {
        let requests_per_minute = if requests_per_minute == 0 {
            debug!(
                "invalid requests_per_minute 0, using default of {}",
                DEFAULT_REQUESTS_PER_MINUTE
            );
            DEFAULT_REQUESTS_PER_MINUTE
        } else {
            requests_per_minute
        };

        Self {
            min_interval: Duration::from_secs(60) / requests_per_minute,
            last_request: Mutex::new(None),
        }
    }

    /// Minimum spacing between the start of two requests
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the next request may start, then claim the slot.
    ///
    /// The timestamp is recorded before the caller sends, so a slow response
    /// never shortens the spacing of the following request.
    pub async fn acquire(&self) {
        let mut last_request = self.last_request.lock().await;

        if let Some(previous) = *last_request {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let deficit = self.min_interval - elapsed;
                debug!("rate limit: waiting {:?} before next request", deficit);
                sleep(deficit).await;
            }
        }

        *last_request = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_REQUESTS_PER_MINUTE)
    }
}
