//! Backend Contract Module
//!
//! The capability every cache backend implements, and the factory that picks
//! a backend from a configuration tag.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use tracing::debug;

use crate::cache::{MemoryCache, NoopCache, RedisCache};
use crate::error::{CacheError, Result};
use crate::token::CancelToken;

/// Default time allowed for the remote connect + handshake.
pub const DEFAULT_CONNECT_TIMEOUT: StdDuration = StdDuration::from_secs(5);

// == Cache Trait ==
/// Operations shared by every backend.
///
/// Every call takes a [`CancelToken`]; a token that has already fired makes
/// the call fail with [`CacheError::Cancelled`] before any work is done.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns the stored value.
    ///
    /// `Ok(None)` is reserved for backends that never store anything; real
    /// backends report absence as [`CacheError::KeyNotFound`].
    async fn get(&self, token: &CancelToken, key: &str) -> Result<Option<String>>;

    /// Inserts or overwrites `key`, expiring `ttl` from now.
    async fn set(&self, token: &CancelToken, key: &str, value: &str, ttl: Duration)
        -> Result<()>;

    /// Removes `key`; absent keys are not an error.
    async fn delete(&self, token: &CancelToken, key: &str) -> Result<()>;

    /// Refreshes the expiry of an existing key.
    async fn set_ttl(&self, token: &CancelToken, key: &str, ttl: Duration) -> Result<()>;

    /// Remaining time to live of an existing key.
    async fn get_ttl(&self, token: &CancelToken, key: &str) -> Result<Duration>;

    /// Whether the key is present.
    async fn exists(&self, token: &CancelToken, key: &str) -> Result<bool>;

    /// Drops every entry.
    async fn clear(&self, token: &CancelToken) -> Result<()>;

    /// Releases backend resources. Call at most once.
    async fn close(&self) -> Result<()>;

    /// Human-readable name of the backend, for diagnostics.
    fn describe(&self) -> &'static str;
}

impl std::fmt::Debug for dyn Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// A backend handle shared by every caller for its lifetime.
pub type SharedCache = Arc<dyn Cache>;

// == Backend Kind ==
/// The available backend variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Process-local entry store
    InMemory,
    /// Redis server
    Remote,
    /// Accepts everything, stores nothing
    Noop,
}

impl BackendKind {
    /// Maps a tag to a backend, degrading unknown tags (including "") to no-op.
    pub fn from_tag(tag: &str) -> Self {
        Self::parse_strict(tag).unwrap_or(BackendKind::Noop)
    }

    /// Maps a tag to a backend, rejecting unknown tags.
    pub fn parse_strict(tag: &str) -> Result<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "in-memory" | "inmemory" | "memory" | "m" => Ok(BackendKind::InMemory),
            "remote" | "redis" | "r" => Ok(BackendKind::Remote),
            "noop" | "no-op" | "dummy" => Ok(BackendKind::Noop),
            other => Err(CacheError::InvalidConfiguration(format!(
                "unknown cache type '{}'",
                other
            ))),
        }
    }

    /// Canonical tag for this kind.
    pub fn as_tag(&self) -> &'static str {
        match self {
            BackendKind::InMemory => "in-memory",
            BackendKind::Remote => "remote",
            BackendKind::Noop => "noop",
        }
    }
}

impl FromStr for BackendKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_strict(s)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

// == Backend Config ==
/// Construction parameters. Only the remote backend reads the connection fields.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend selector, see [`BackendKind::from_tag`]
    pub kind: String,
    /// Server address, `host:port`
    pub address: String,
    /// Server password, empty for none
    pub password: String,
    /// Numeric database selected after connecting
    pub db: i64,
    /// Time allowed for connect + handshake
    pub connect_timeout: StdDuration,
}

impl BackendConfig {
    /// Config for the given tag with default connection parameters.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: String::new(),
            address: "localhost:6379".to_string(),
            password: String::new(),
            db: 0,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

// == Factory ==
/// Builds the backend named by `config.kind`.
///
/// Unknown tags fall back to the no-op backend. The remote backend fails with
/// [`CacheError::BackendUnavailable`] when it cannot connect.
pub async fn connect(config: &BackendConfig) -> Result<SharedCache> {
    build(BackendKind::from_tag(&config.kind), config).await
}

/// Like [`connect`], but unknown tags fail with [`CacheError::InvalidConfiguration`].
pub async fn connect_strict(config: &BackendConfig) -> Result<SharedCache> {
    build(BackendKind::parse_strict(&config.kind)?, config).await
}

async fn build(kind: BackendKind, config: &BackendConfig) -> Result<SharedCache> {
    let cache: SharedCache = match kind {
        BackendKind::InMemory => Arc::new(MemoryCache::new()),
        BackendKind::Noop => Arc::new(NoopCache::new()),
        BackendKind::Remote => Arc::new(
            RedisCache::connect(
                &config.address,
                &config.password,
                config.db,
                config.connect_timeout,
            )
            .await?,
        ),
    };
    debug!(backend = %kind, "{}", cache.describe());
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_known() {
        assert_eq!(BackendKind::from_tag("in-memory"), BackendKind::InMemory);
        assert_eq!(BackendKind::from_tag("m"), BackendKind::InMemory);
        assert_eq!(BackendKind::from_tag("remote"), BackendKind::Remote);
        assert_eq!(BackendKind::from_tag("REDIS"), BackendKind::Remote);
    }

    #[test]
    fn test_from_tag_unknown_degrades_to_noop() {
        assert_eq!(BackendKind::from_tag(""), BackendKind::Noop);
        assert_eq!(BackendKind::from_tag("memcached"), BackendKind::Noop);
    }

    #[test]
    fn test_parse_strict_rejects_unknown() {
        assert!(matches!(
            BackendKind::parse_strict("memcached"),
            Err(CacheError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            "".parse::<BackendKind>(),
            Err(CacheError::InvalidConfiguration(_))
        ));
        assert_eq!("noop".parse::<BackendKind>(), Ok(BackendKind::Noop));
    }

    #[test]
    fn test_tag_round_trip() {
        for kind in [BackendKind::InMemory, BackendKind::Remote, BackendKind::Noop] {
            assert_eq!(BackendKind::parse_strict(kind.as_tag()), Ok(kind));
        }
    }

    #[tokio::test]
    async fn test_connect_builds_variants() {
        let memory = connect(&BackendConfig::new("in-memory")).await.unwrap();
        assert!(memory.describe().starts_with("MemoryCache"));

        let noop = connect(&BackendConfig::new("whatever")).await.unwrap();
        assert!(noop.describe().starts_with("NoopCache"));
        assert_ne!(memory.describe(), noop.describe());
    }

    #[tokio::test]
    async fn test_connect_strict_rejects_unknown_tag() {
        let result = connect_strict(&BackendConfig::new("whatever")).await;
        assert!(matches!(result, Err(CacheError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_connect_remote_unreachable() {
        let config = BackendConfig {
            kind: "remote".to_string(),
            address: "127.0.0.1:1".to_string(),
            connect_timeout: StdDuration::from_millis(500),
            ..BackendConfig::default()
        };

        let result = connect(&config).await;
        assert!(matches!(result, Err(CacheError::BackendUnavailable(_))));
    }
}
