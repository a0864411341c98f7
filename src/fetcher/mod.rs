//! HTTP fetching for the BoardGameGeek XML API
//!
//! The fetcher stack is layered the same way for every endpoint:
//!
//! - [`transport`] performs raw GET requests (`reqwest`), optionally behind the
//!   [`rate_limit::RateLimiter`] and the response [`cache`]
//! - [`bgg_http`] wraps one logical request with the retry policy and decodes the XML body
//! - [`pagination`] drives repeated page requests and merges them into an aggregate

pub mod bgg_http;
pub mod cache;
pub mod pagination;
pub mod rate_limit;
pub mod retry_formatter;
pub mod shared_resources;
pub mod transport;

pub use bgg_http::BggHttpClient;
pub use pagination::{PageAggregate, PaginationHelper, ProgressError, ProgressSink};
pub use rate_limit::RateLimiter;
pub use transport::{RawResponse, Transport, TransportError};

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// The requested guild, user, game or collection does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid arguments, rejected before any request is sent
    #[error("invalid argument: {0}")]
    Validation(String),

    /// Unparsable body or unexpected content type
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server kept answering "try again later" until the retry budget ran out.
    ///
    /// `max_retries == 0` means retrying was disabled by configuration.
    #[error("request still pending after {attempts} attempts (max retries: {max_retries})")]
    RetryExhausted {
        /// Requests sent, including the first one
        attempts: u32,
        /// Configured retry budget
        max_retries: u32,
    },

    /// The transport kept timing out until the retry budget ran out
    #[error("request timed out after {attempts} attempts")]
    Timeout {
        /// Requests sent, including the first one
        attempts: u32,
    },

    /// Non-retryable HTTP status
    #[error("HTTP error {status}: {message}")]
    Http {
        /// Response status code
        status: u16,
        /// Leading part of the response body
        message: String,
    },

    /// Connection level failure other than a timeout
    #[error("network error: {0}")]
    Network(String),

    /// A progress callback returned an error
    #[error("fetch aborted by progress callback: {0}")]
    Aborted(#[source] ProgressError),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;
