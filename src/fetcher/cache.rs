//! Response cache
//!
//! Identical requests inside the TTL are answered from the cache without
//! touching the network (and without consuming rate-limit budget, since the
//! cache sits in front of the rate-limited transport). Only `200` responses
//! are stored, so pending (`202`) and error answers are always re-requested.
//!
//! The backend is selected with a URI-like string:
//!
//! | URI                          | Backend                              |
//! |------------------------------|--------------------------------------|
//! | `none://` or empty           | no cache                             |
//! | `memory:///?ttl=3600`        | in-process map                       |
//! | `file:///var/cache/bgg?ttl=N`| one JSON file per request in the dir |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::transport::{RawResponse, Transport, TransportError};
use super::{FetcherError, FetcherResult};

/// Default TTL when the URI does not carry one
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Only responses with this status are cached
const CACHEABLE_STATUS: u16 = 200;

/// Cache backend selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheConfig {
    /// Every request goes to the network
    None,
    /// In-process cache, lost on exit
    Memory {
        /// Entry lifetime
        ttl: Duration,
    },
    /// On-disk cache in `dir`
    File {
        /// Directory holding the entries
        dir: PathBuf,
        /// Entry lifetime
        ttl: Duration,
    },
}

impl CacheConfig {
    /// Parse a cache URI
    ///
    /// # Errors
    /// Returns [`FetcherError::Validation`] for unknown schemes, a missing
    /// directory for `file://`, or a ttl that is not a whole number of seconds.
    pub fn from_uri(uri: &str) -> FetcherResult<Self> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Ok(CacheConfig::None);
        }

        let parsed = Url::parse(uri)
            .map_err(|e| FetcherError::Validation(format!("invalid cache URI '{uri}': {e}")))?;

        let ttl = match parsed.query_pairs().find(|(key, _)| key == "ttl") {
            Some((_, value)) => Duration::from_secs(value.parse::<u64>().map_err(|_| {
                FetcherError::Validation(format!("invalid cache ttl '{value}' in '{uri}'"))
            })?),
            None => Duration::from_secs(DEFAULT_TTL_SECS),
        };

        match parsed.scheme() {
            "none" => Ok(CacheConfig::None),
            "memory" => Ok(CacheConfig::Memory { ttl }),
            "file" => {
                let dir = parsed.to_file_path().map_err(|_| {
                    FetcherError::Validation(format!("cache URI '{uri}' has no usable path"))
                })?;
                if dir.as_os_str().is_empty() || dir == PathBuf::from("/") {
                    return Err(FetcherError::Validation(format!(
                        "cache URI '{uri}' must name a directory"
                    )));
                }
                Ok(CacheConfig::File { dir, ttl })
            }
            other => Err(FetcherError::Validation(format!(
                "unsupported cache backend '{other}' (expected none, memory or file)"
            ))),
        }
    }

    /// Put `inner` behind the configured cache
    pub fn wrap(self, inner: Arc<dyn Transport>) -> Arc<dyn Transport> {
        match self {
            CacheConfig::None => inner,
            CacheConfig::Memory { ttl } => {
                Arc::new(CachedTransport::new(inner, Arc::new(MemoryStore::new(ttl)), ttl))
            }
            CacheConfig::File { dir, ttl } => {
                Arc::new(CachedTransport::new(inner, Arc::new(FileStore::new(dir)), ttl))
            }
        }
    }
}

/// Cache backend errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Reading or writing an entry failed
    #[error("cache IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored entry could not be (de)serialized
    #[error("cache entry error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A stored response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// When the response was received
    pub stored_at: DateTime<Utc>,
    /// HTTP status (always 200 for stored entries)
    pub status: u16,
    /// `Content-Type` header
    pub content_type: Option<String>,
    /// Body text
    pub body: String,
}

impl CachedResponse {
    fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now < self.stored_at + ttl,
            Err(_) => true,
        }
    }

    fn into_response(self) -> RawResponse {
        RawResponse {
            status: self.status,
            content_type: self.content_type,
            body: self.body,
        }
    }
}

/// Storage behind a [`CachedTransport`]
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Fetch the entry stored under `key`
    async fn load(&self, key: &str) -> Result<Option<CachedResponse>, CacheError>;
    /// Store `entry` under `key`, replacing any previous one
    async fn store(&self, key: &str, entry: CachedResponse) -> Result<(), CacheError>;
}

/// In-process store
///
/// Entries older than the TTL are dropped when looked up, and swept on every write.
#[derive(Debug)]
pub struct MemoryStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedResponse>>,
}

impl MemoryStore {
    /// Empty store keeping entries for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Entries currently held, stale ones included until the next sweep
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResponseStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<CachedResponse>, CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let fresh = entries.get(key).map(|entry| entry.is_fresh(self.ttl, Utc::now()));
        if fresh == Some(false) {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).cloned())
    }

    async fn store(&self, key: &str, entry: CachedResponse) -> Result<(), CacheError> {
        let now = Utc::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, cached| cached.is_fresh(self.ttl, now));
        if entries.len() < before {
            debug!("evicted {} stale cache entries", before - entries.len());
        }
        entries.insert(key.to_string(), entry);
        Ok(())
    }
}

/// On-disk store, one `<key>.json` file per request
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store entries under `dir` (created on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl ResponseStore for FileStore {
    async fn load(&self, key: &str) -> Result<Option<CachedResponse>, CacheError> {
        match tokio::fs::read(self.entry_path(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, key: &str, entry: CachedResponse) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let bytes = serde_json::to_vec(&entry)?;

        // Write then rename so readers never see a partial entry
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, self.entry_path(key)).await?;
        Ok(())
    }
}

/// Canonical cache key: SHA-256 of the URL and the sorted query parameters
pub fn cache_key(url: &str, params: &[(&str, String)]) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    for (key, value) in sorted {
        hasher.update(b"\0");
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }

    format!("{:x}", hasher.finalize())
}

/// Transport answering repeated requests from a [`ResponseStore`]
pub struct CachedTransport {
    inner: Arc<dyn Transport>,
    store: Arc<dyn ResponseStore>,
    ttl: Duration,
}

impl CachedTransport {
    /// Cache `inner`'s successful responses in `store` for `ttl`
    pub fn new(inner: Arc<dyn Transport>, store: Arc<dyn ResponseStore>, ttl: Duration) -> Self {
        Self { inner, store, ttl }
    }
}

#[async_trait]
impl Transport for CachedTransport {
    async fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        let key = cache_key(url, params);

        match self.store.load(&key).await {
            Ok(Some(entry)) if entry.is_fresh(self.ttl, Utc::now()) => {
                debug!("cache hit for {}", url);
                return Ok(entry.into_response());
            }
            Ok(_) => {}
            Err(e) => warn!("ignoring unreadable cache entry for {}: {}", url, e),
        }

        let response = self.inner.get(url, params, timeout).await?;

        if response.status == CACHEABLE_STATUS {
            let entry = CachedResponse {
                stored_at: Utc::now(),
                status: response.status,
                content_type: response.content_type.clone(),
                body: response.body.clone(),
            };
            if let Err(e) = self.store.store(&key, entry).await {
                warn!("failed to cache response for {}: {}", url, e);
            }
        }

        Ok(response)
    }
}
