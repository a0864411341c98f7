//! `bgg` command line tool

pub mod commands;
pub mod error;

use clap::{Parser, Subcommand};
use std::str::FromStr;
use std::time::Duration;

use crate::config::{
    ClientConfig, RetryPolicy, DEFAULT_API_ENDPOINT, DEFAULT_CACHE, DEFAULT_MAX_RETRIES,
    DEFAULT_REQUESTS_PER_MINUTE, DEFAULT_RETRY_DELAY_SECS, DEFAULT_TIMEOUT_SECS,
};

pub use commands::{
    CollectionArgs, FamilyArgs, GameArgs, GuildArgs, HotArgs, PlaysArgs, SearchArgs, UserArgs,
};
pub use error::CliError;

/// BoardGameGeek command line client
#[derive(Parser, Debug)]
#[command(name = "bgg")]
#[command(about = "Query the BoardGameGeek XML API", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// API base URL
    #[arg(long, global = true, default_value = DEFAULT_API_ENDPOINT)]
    pub api_endpoint: String,

    /// Response cache: none://, memory:///?ttl=SECS or file:///DIR?ttl=SECS
    #[arg(long, global = true, default_value = DEFAULT_CACHE)]
    pub cache: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub timeout: u64,

    /// Retries for pending, overloaded or timed out requests (0 disables retrying)
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_RETRIES, value_parser = clap::value_parser!(u32).range(0..=20))]
    pub max_retries: u32,

    /// Initial delay before a retry, in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_RETRY_DELAY_SECS as f64, value_parser = parse_delay)]
    pub retry_delay: f64,

    /// Request budget per minute, shared by all requests of this process
    #[arg(long, global = true, default_value_t = DEFAULT_REQUESTS_PER_MINUTE, value_parser = clap::value_parser!(u32).range(1..=600))]
    pub requests_per_minute: u32,
}

impl Cli {
    /// Client configuration from the global flags
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_endpoint: self.api_endpoint.clone(),
            cache: self.cache.clone(),
            requests_per_minute: self.requests_per_minute,
            retry: RetryPolicy {
                max_retries: self.max_retries,
                retry_delay: Duration::from_secs_f64(self.retry_delay),
                timeout: Duration::from_secs(self.timeout),
                ..RetryPolicy::default()
            },
        }
    }
}

fn parse_delay(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number of seconds"))?;
    if !value.is_finite() || !(0.0..=3600.0).contains(&value) {
        return Err(format!("retry delay must be between 0 and 3600 seconds, got {s}"));
    }
    Ok(value)
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a user profile with buddies, guilds, hot and top lists
    User(UserArgs),
    /// Show a guild and its members
    Guild(GuildArgs),
    /// Show a game by id or name
    Game(GameArgs),
    /// Show a family and the items linked to it
    Family(FamilyArgs),
    /// List plays of a user or a game
    Plays(PlaysArgs),
    /// List a user's collection
    Collection(CollectionArgs),
    /// Search items by name
    Search(SearchArgs),
    /// Show a hot list
    Hot(HotArgs),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}. Valid options: json, human")),
        }
    }
}
