//! In-memory backend.
//!
//! Routes every operation through the cancellation guard into an
//! [`EntryStore`] owned by this handle.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;

use crate::cache::guard::run_guarded;
use crate::cache::{Cache, EntryStore};
use crate::error::Result;
use crate::token::CancelToken;

/// Process-local cache with lazy TTL expiry.
///
/// Cloning yields another handle to the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    store: Arc<EntryStore>,
}

impl MemoryCache {
    /// Creates a cache with its own empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct access to the underlying store.
    pub fn store(&self) -> &EntryStore {
        &self.store
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, token: &CancelToken, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        run_guarded(token, &self.store, move |store| store.get(&key).map(Some)).await
    }

    async fn set(
        &self,
        token: &CancelToken,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        run_guarded(token, &self.store, move |store| {
            store.set(key, value, ttl);
            Ok(())
        })
        .await
    }

    async fn delete(&self, token: &CancelToken, key: &str) -> Result<()> {
        let key = key.to_string();
        run_guarded(token, &self.store, move |store| {
            store.delete(&key);
            Ok(())
        })
        .await
    }

    async fn set_ttl(&self, token: &CancelToken, key: &str, ttl: Duration) -> Result<()> {
        let key = key.to_string();
        run_guarded(token, &self.store, move |store| store.set_ttl(&key, ttl)).await
    }

    async fn get_ttl(&self, token: &CancelToken, key: &str) -> Result<Duration> {
        let key = key.to_string();
        run_guarded(token, &self.store, move |store| store.get_ttl(&key)).await
    }

    async fn exists(&self, token: &CancelToken, key: &str) -> Result<bool> {
        let key = key.to_string();
        run_guarded(token, &self.store, move |store| Ok(store.exists(&key))).await
    }

    async fn clear(&self, token: &CancelToken) -> Result<()> {
        run_guarded(token, &self.store, |store| {
            store.clear();
            Ok(())
        })
        .await
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> &'static str {
        "MemoryCache: a process-local cache with lazy TTL expiry"
    }
}
