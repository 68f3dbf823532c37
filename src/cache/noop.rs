//! No-op backend.

use async_trait::async_trait;
use chrono::Duration;

use crate::cache::Cache;
use crate::error::Result;
use crate::token::CancelToken;

/// Accepts every operation and stores nothing.
///
/// Used when no backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl NoopCache {
    /// Creates the no-op backend.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Cache for NoopCache {
    async fn get(&self, token: &CancelToken, _key: &str) -> Result<Option<String>> {
        token.check()?;
        Ok(None)
    }

    async fn set(
        &self,
        token: &CancelToken,
        _key: &str,
        _value: &str,
        _ttl: Duration,
    ) -> Result<()> {
        token.check()
    }

    async fn delete(&self, token: &CancelToken, _key: &str) -> Result<()> {
        token.check()
    }

    async fn set_ttl(&self, token: &CancelToken, _key: &str, _ttl: Duration) -> Result<()> {
        token.check()
    }

    async fn get_ttl(&self, token: &CancelToken, _key: &str) -> Result<Duration> {
        token.check()?;
        Ok(Duration::zero())
    }

    async fn exists(&self, token: &CancelToken, _key: &str) -> Result<bool> {
        token.check()?;
        Ok(false)
    }

    async fn clear(&self, token: &CancelToken) -> Result<()> {
        token.check()
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> &'static str {
        "NoopCache: accepts every operation and stores nothing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;

    #[tokio::test]
    async fn test_noop_reads_are_empty() {
        let cache = NoopCache::new();
        let token = CancelToken::new();

        cache.set(&token, "k", "v", Duration::seconds(30)).await.unwrap();

        assert_eq!(cache.get(&token, "k").await.unwrap(), None);
        assert!(!cache.exists(&token, "k").await.unwrap());
        assert_eq!(cache.get_ttl(&token, "k").await.unwrap(), Duration::zero());
    }

    #[tokio::test]
    async fn test_noop_mutations_succeed() {
        let cache = NoopCache::new();
        let token = CancelToken::new();

        assert!(cache.delete(&token, "k").await.is_ok());
        assert!(cache.set_ttl(&token, "k", Duration::seconds(1)).await.is_ok());
        assert!(cache.clear(&token).await.is_ok());
        assert!(cache.close().await.is_ok());
        assert!(cache.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_noop_honours_cancelled_token() {
        let cache = NoopCache::new();
        let token = CancelToken::new();
        token.cancel();

        assert_eq!(cache.get(&token, "k").await, Err(CacheError::Cancelled));
        assert_eq!(cache.clear(&token).await, Err(CacheError::Cancelled));
    }
}
