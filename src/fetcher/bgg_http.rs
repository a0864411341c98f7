//! Fetch-with-retry for the XML API
//!
//! One call to [`BggHttpClient::fetch_page`] is one logical request. The raw
//! response is classified as:
//!
//! - `202 Accepted`: the server queued the request ("try again shortly"),
//!   repeated after `retry_delay`, which then grows by the pending backoff
//! - `429`/`503`: the server is shedding load, repeated after `retry_delay`,
//!   which then grows by the overload backoff
//! - transport timeout: repeated at once with a longer timeout
//! - any other 2xx: must be XML and parse into the requested page record
//! - anything else: [`FetcherError::Http`], not retried
//!
//! All three retryable conditions draw from the same budget.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use super::retry_formatter::{RetryContext, RetryReason};
use super::transport::{RawResponse, Transport, TransportError};
use super::{FetcherError, FetcherResult};
use crate::config::{Backoff, RetryPolicy};
use crate::xml;

/// Status the API uses for "processing, retry later"
pub const STATUS_PENDING: u16 = 202;

/// Statuses observed when the API sheds load
pub const STATUS_OVERLOADED: [u16; 2] = [429, 503];

/// Longest body excerpt carried in an HTTP error
const ERROR_BODY_EXCERPT: usize = 200;

/// Mutable state of one logical request
#[derive(Debug)]
struct RetryState {
    remaining: u32,
    timeout: Duration,
    delay: Duration,
    attempts: u32,
}

impl RetryState {
    fn new(policy: &RetryPolicy) -> Self {
        Self {
            remaining: policy.max_retries,
            timeout: policy.timeout,
            delay: policy.retry_delay,
            attempts: 0,
        }
    }
}

/// XML API client applying the retry policy to every request
#[derive(Clone)]
pub struct BggHttpClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    policy: RetryPolicy,
}

impl BggHttpClient {
    /// Create a client for `base_url` (e.g. `https://boardgamegeek.com/xmlapi2`)
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>, policy: RetryPolicy) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self {
            transport,
            base_url,
            policy,
        }
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch `endpoint` and decode the XML body into `T`
    ///
    /// # Errors
    /// - [`FetcherError::RetryExhausted`] when the server stays pending or overloaded
    /// - [`FetcherError::Timeout`] when every attempt times out
    /// - [`FetcherError::Protocol`] for non-XML or malformed bodies
    /// - [`FetcherError::Http`] / [`FetcherError::Network`] for other failures
    pub async fn fetch_page<T>(&self, endpoint: &str, params: &[(&str, String)]) -> FetcherResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        let response = self.request_with_retry(&url, params, &self.policy).await?;

        if !response.is_xml() {
            return Err(FetcherError::Protocol(format!(
                "expected an XML document from {}, got content type {:?}",
                url, response.content_type
            )));
        }

        xml::parse_document(&response.body)
    }

    async fn request_with_retry(
        &self,
        url: &str,
        params: &[(&str, String)],
        policy: &RetryPolicy,
    ) -> FetcherResult<RawResponse> {
        let mut state = RetryState::new(policy);
        let max_attempts = policy.max_retries + 1;

        loop {
            state.attempts += 1;

            let response = match self.transport.get(url, params, state.timeout).await {
                Ok(response) => response,
                Err(TransportError::Timeout) => {
                    let ctx = RetryContext::new(
                        state.attempts,
                        max_attempts,
                        RetryReason::Timeout,
                        Duration::ZERO,
                        url,
                    );
                    if state.remaining == 0 {
                        error!("{}", ctx.format_failure());
                        return Err(FetcherError::Timeout {
                            attempts: state.attempts,
                        });
                    }
                    warn!("{}", ctx.format_retry());
                    state.timeout = policy.timeout_growth.next(state.timeout);
                    state.remaining -= 1;
                    continue;
                }
                Err(TransportError::Network(message)) => {
                    return Err(FetcherError::Network(message));
                }
            };

            let status = response.status;

            if status == STATUS_PENDING {
                self.wait_for_retry(&mut state, policy, &policy.pending, RetryReason::Pending, url)
                    .await?;
                continue;
            }

            if STATUS_OVERLOADED.contains(&status) {
                self.wait_for_retry(
                    &mut state,
                    policy,
                    &policy.overload,
                    RetryReason::Overloaded(status),
                    url,
                )
                .await?;
                continue;
            }

            if (200..300).contains(&status) {
                if state.attempts > 1 {
                    debug!("request to {} succeeded on attempt {}", url, state.attempts);
                }
                return Ok(response);
            }

            let message: String = response.body.chars().take(ERROR_BODY_EXCERPT).collect();
            return Err(FetcherError::Http { status, message });
        }
    }

    /// Sleep before repeating a pending or overloaded request, or fail when
    /// no retries are left.
    async fn wait_for_retry(
        &self,
        state: &mut RetryState,
        policy: &RetryPolicy,
        backoff: &Backoff,
        reason: RetryReason,
        url: &str,
    ) -> FetcherResult<()> {
        let ctx = RetryContext::new(
            state.attempts,
            policy.max_retries + 1,
            reason,
            state.delay,
            url,
        );

        if policy.max_retries == 0 {
            debug!("retries disabled, giving up on {} ({})", url, reason.description());
            return Err(FetcherError::RetryExhausted {
                attempts: state.attempts,
                max_retries: 0,
            });
        }

        if state.remaining == 0 {
            error!("{}", ctx.format_failure());
            return Err(FetcherError::RetryExhausted {
                attempts: state.attempts,
                max_retries: policy.max_retries,
            });
        }

        warn!("{}", ctx.format_retry());
        sleep(state.delay).await;
        state.delay = backoff.next(state.delay);
        state.remaining -= 1;
        Ok(())
    }
}
