//! # BoardGameGeek XML API client
//!
//! Typed access to the BoardGameGeek XML API v2: guilds, users, plays,
//! collections, hot lists, search and game details.
//!
//! ## Features
//!
//! - **Paginated fetching**: guild members, buddies/guilds and plays are merged
//!   across pages into one entity, with a progress callback after every page
//! - **Retries**: "try again later" (202), overload (429/503) and timeouts are
//!   retried with growing delays
//! - **Rate limiting**: one request budget shared by every client in the process
//! - **Caching**: optional in-memory or on-disk response cache
//!
//! ## Quick Start
//!
//! ```no_run
//! use bgg_client::{BggClient, ClientConfig, ProgressError};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bgg = BggClient::new(ClientConfig::default())?;
//!
//! let mut progress = |fetched: usize, total: usize| -> Result<(), ProgressError> {
//!     println!("{fetched}/{total} members");
//!     Ok(())
//! };
//! let guild = bgg.fetch_guild(1229, Some(&mut progress), true).await?;
//! println!("{} has {} members", guild.name, guild.members.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - transport, cache, rate limiter, retry and pagination
//! - [`xml`] - XML decoding and attribute conversion helpers
//! - [`objects`] - domain types and their page aggregates
//! - [`client`] - [`BggClient`], one method per API operation
//! - [`cli`] - the `bgg` command line tool

#![warn(clippy::all)]

/// The `bgg` command line tool
pub mod cli;

/// Public client operations
pub mod client;

/// Client configuration
pub mod config;

/// HTTP fetching, retries and pagination
pub mod fetcher;

/// Domain objects
pub mod objects;

/// XML decoding helpers
pub mod xml;

pub use client::{BggClient, ChoosePolicy, CollectionQuery, GameLookup, PlaysQuery, UserOptions};
pub use config::{Backoff, ClientConfig, RetryPolicy};
pub use fetcher::{FetcherError, FetcherResult, ProgressError, ProgressSink};
pub use objects::{
    Collection, CollectionItem, Family, Game, Guild, HotItem, HotItemKind, HotItems, PlaySession,
    Plays, SearchKind, SearchResult, User,
};
