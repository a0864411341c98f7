//! Process-wide HTTP client and rate limiter
//!
//! The API throttles per client address, so every [`crate::BggClient`] in the
//! process must draw from the same request budget. The limiter is created by
//! the first caller and handed out to everybody after that.

use once_cell::sync::{Lazy, OnceCell};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::rate_limit::RateLimiter;

/// HTTP connect timeout (seconds)
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Global HTTP client shared by all transports.
///
/// Request timeouts are set per request by the retry logic, only the connect
/// timeout is fixed here.
static GLOBAL_HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .user_agent(concat!("bgg-client/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            panic!("FATAL: Failed to build HTTP client: {}. Check system TLS configuration.", e);
        })
});

static GLOBAL_RATE_LIMITER: OnceCell<Arc<RateLimiter>> = OnceCell::new();

/// Get the global HTTP client (clones share the connection pool)
pub fn global_http_client() -> Client {
    GLOBAL_HTTP_CLIENT.clone()
}

/// Get the process-wide rate limiter.
///
/// The first call fixes the budget; later calls get the same instance and
/// their `requests_per_minute` is ignored.
pub fn global_rate_limiter(requests_per_minute: u32) -> Arc<RateLimiter> {
    GLOBAL_RATE_LIMITER
        .get_or_init(|| {
            debug!("creating global rate limiter ({} requests/minute)", requests_per_minute);
            Arc::new(RateLimiter::new(requests_per_minute))
        })
        .clone()
}
