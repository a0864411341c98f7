//! Client configuration and retry policy

use serde::Deserialize;
use std::time::Duration;

/// Default XML API v2 endpoint
pub const DEFAULT_API_ENDPOINT: &str = "https://boardgamegeek.com/xmlapi2";

/// Default cache: in-memory, one hour
pub const DEFAULT_CACHE: &str = "memory:///?ttl=3600";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default retry budget for pending/overload/timeout responses
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before retrying a pending request, in seconds
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

/// Default request budget per minute
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 30;

/// Guild members listed per page by the guild endpoint
pub const GUILD_MEMBERS_PER_PAGE: usize = 25;

/// Buddies and guilds listed per page by the user endpoint
pub const USER_BUDDIES_PER_PAGE: usize = 100;

/// Plays listed per page by the plays endpoint
pub const PLAYS_PER_PAGE: usize = 100;

/// Multiplicative growth of a delay or timeout between attempts
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Backoff {
    /// Factor applied after each retry, finite and positive
    #[serde(deserialize_with = "multiplier::deserialize")]
    pub multiplier: f64,
    /// Upper bound for the grown value
    #[serde(default, with = "opt_secs")]
    pub cap: Option<Duration>,
}

impl Backoff {
    /// Backoff without an upper bound
    pub const fn uncapped(multiplier: f64) -> Self {
        Self {
            multiplier,
            cap: None,
        }
    }

    /// Grow `current` by the multiplier, clamped to the cap
    ///
    /// Growth saturates at [`Duration::MAX`]. A multiplier that is not finite
    /// and positive leaves `current` unchanged.
    pub fn next(&self, current: Duration) -> Duration {
        let grown = if self.multiplier.is_finite() && self.multiplier > 0.0 {
            Duration::try_from_secs_f64(current.as_secs_f64() * self.multiplier)
                .unwrap_or(Duration::MAX)
        } else {
            current
        };
        match self.cap {
            Some(cap) => grown.min(cap),
            None => grown,
        }
    }
}

/// Retry behaviour of a single logical request
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Initial wait before repeating a pending or overloaded request
    #[serde(with = "secs")]
    pub retry_delay: Duration,
    /// Initial transport timeout
    #[serde(with = "secs")]
    pub timeout: Duration,
    /// Delay growth after a "processing, retry later" response
    pub pending: Backoff,
    /// Delay growth after an overload response
    pub overload: Backoff,
    /// Timeout growth after a transport timeout
    pub timeout_growth: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            pending: Backoff::uncapped(1.5),
            overload: Backoff::uncapped(3.0),
            timeout_growth: Backoff::uncapped(2.5),
        }
    }
}

/// Top level client configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the XML API
    pub api_endpoint: String,
    /// Cache URI (`none://`, `memory:///?ttl=N`, `file:///dir?ttl=N`)
    pub cache: String,
    /// Outgoing request budget, shared process-wide
    pub requests_per_minute: u32,
    /// Retry policy applied to every request
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            cache: DEFAULT_CACHE.to_string(),
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Configuration without any response cache
    pub fn uncached() -> Self {
        Self {
            cache: "none://".to_string(),
            ..Self::default()
        }
    }
}

mod secs {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn from_f64<E: Error>(secs: f64) -> Result<Duration, E> {
        Duration::try_from_secs_f64(secs)
            .map_err(|e| E::custom(format!("invalid duration {secs} seconds: {e}")))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        from_f64(f64::deserialize(deserializer)?)
    }
}

mod opt_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(deserializer)?
            .map(super::secs::from_f64::<D::Error>)
            .transpose()
    }
}

mod multiplier {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(D::Error::custom(format!(
                "backoff multiplier must be finite and positive, got {value}"
            )))
        }
    }
}
