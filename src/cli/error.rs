//! CLI error types and conversions

use crate::fetcher::FetcherError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Fetcher error
    #[error("{0}")]
    FetcherError(#[from] FetcherError),

    /// Invalid argument combination
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// JSON rendering failed
    #[error("output error: {0}")]
    OutputError(#[from] serde_json::Error),
}

impl CliError {
    /// Whether the failure was caused by the command line rather than the server
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            CliError::InvalidArgument(_) | CliError::FetcherError(FetcherError::Validation(_))
        )
    }
}
