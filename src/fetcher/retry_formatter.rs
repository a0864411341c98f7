//! Retry message formatting
//!
//! Keeps the retry and failure log lines of [`super::bgg_http`] uniform: attempt
//! counters, a short reason, the wait before the next attempt and the endpoint.

use std::time::Duration;

/// Why a request is being repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// The server accepted the request but the data is not ready yet
    Pending,
    /// The server refused the request because of load
    Overloaded(u16),
    /// The transport timed out
    Timeout,
}

impl RetryReason {
    /// Short description used inside log messages
    pub fn description(&self) -> &'static str {
        match self {
            Self::Pending => "request queued by server",
            Self::Overloaded(429) => "too many requests",
            Self::Overloaded(_) => "server overloaded",
            Self::Timeout => "request timeout",
        }
    }

    /// Remediation hint shown when the retry budget runs out
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Pending => "The server is still preparing the data, try again in a few minutes",
            Self::Overloaded(_) => "Lower --requests-per-minute or raise --retry-delay",
            Self::Timeout => "Raise --timeout or check your network connection",
        }
    }
}

/// Context for one retry decision
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// Attempt that just failed (1-based)
    pub attempt: u32,
    /// Total attempts allowed (retries + 1)
    pub max_attempts: u32,
    /// What went wrong
    pub reason: RetryReason,
    /// Wait before the next attempt (zero for timeouts)
    pub backoff: Duration,
    /// Endpoint that was requested
    pub endpoint: String,
}

impl RetryContext {
    /// Build the context for a failed attempt
    pub fn new(
        attempt: u32,
        max_attempts: u32,
        reason: RetryReason,
        backoff: Duration,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            attempt,
            max_attempts,
            reason,
            backoff,
            endpoint: endpoint.into(),
        }
    }

    /// Message logged before the next attempt
    pub fn format_retry(&self) -> String {
        format!(
            "Retrying (attempt {}/{}) after {} - waiting {:.1} seconds... ({})",
            self.attempt + 1,
            self.max_attempts,
            self.reason.description(),
            self.backoff.as_secs_f64(),
            self.endpoint
        )
    }

    /// Message logged when the budget is exhausted
    pub fn format_failure(&self) -> String {
        [
            format!("[FAILED] Request failed after {} attempts", self.attempt),
            format!("  Last error: {}", self.reason.description()),
            format!("  Endpoint: {}", self.endpoint),
            format!("  Suggestion: {}", self.reason.suggestion()),
        ]
        .join("\n")
    }
}
