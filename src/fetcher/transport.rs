//! Raw HTTP transport
//!
//! [`Transport`] is the seam between the retry logic and the network: it sends
//! one GET and hands back status, content type and body untouched. Decorators
//! add rate limiting ([`RateLimitedTransport`]) and caching
//! ([`super::cache::CachedTransport`]) without the retry logic knowing.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::rate_limit::RateLimiter;

/// Response as received from the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// `Content-Type` header, if any
    pub content_type: Option<String>,
    /// Body text
    pub body: String,
}

impl RawResponse {
    /// Convenience constructor for an XML response
    pub fn xml(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some("text/xml; charset=utf-8".to_string()),
            body: body.into(),
        }
    }

    /// Whether the content type announces an XML document
    pub fn is_xml(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("xml"))
            .unwrap_or(false)
    }
}

/// Transport level failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request did not complete within the timeout
    #[error("request timed out")]
    Timeout,

    /// Connection refused, DNS failure, broken body, ...
    #[error("network error: {0}")]
    Network(String),
}

/// Performs a single GET request
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `GET url?params` and wait at most `timeout` for the full response
    async fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<RawResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        (**self).get(url, params, timeout).await
    }
}

/// `reqwest` backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Wrap an existing client (cloning a `reqwest::Client` shares its pool)
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        debug!("GET {} with {} params (timeout {:?})", url, params.len(), timeout);

        let response = self
            .client
            .get(url)
            .query(params)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.to_string())
    }
}

/// Transport that claims a [`RateLimiter`] slot before every request
pub struct RateLimitedTransport<T> {
    inner: T,
    rate_limiter: Arc<RateLimiter>,
}

impl<T: Transport> RateLimitedTransport<T> {
    /// Put `inner` behind `rate_limiter`
    pub fn new(inner: T, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            inner,
            rate_limiter,
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for RateLimitedTransport<T> {
    async fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        self.rate_limiter.acquire().await;
        self.inner.get(url, params, timeout).await
    }
}
