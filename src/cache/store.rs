//! Entry Store Module
//!
//! Concurrency-safe key-value storage with lazy TTL expiration. There is no
//! background sweeper: expired entries are removed when `get` observes them.

use std::collections::HashMap;

use chrono::Duration;
use parking_lot::RwLock;

use crate::cache::CacheEntry;
use crate::error::{CacheError, Result};

// == Entry Store ==
/// Key-value storage guarded by a single reader/writer lock.
///
/// Reads (`get` before eviction, `get_ttl`, `exists`) share the lock; every
/// mutation, including the eviction inside `get`, takes it exclusively. The
/// lock is never held across an await point.
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl EntryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// An expired entry is evicted and reported as [`CacheError::KeyExpired`];
    /// the next `get` on that key reports [`CacheError::KeyNotFound`].
    pub fn get(&self, key: &str) -> Result<String> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return Err(CacheError::KeyNotFound(key.to_string())),
                Some(entry) if !entry.is_expired() => return Ok(entry.value.clone()),
                Some(_) => {}
            }
        }

        // Re-check under the write lock: another caller may have evicted or
        // rewritten the key between the two acquisitions.
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(CacheEntry::is_expired) {
            entries.remove(key);
        }
        Err(CacheError::KeyExpired(key.to_string()))
    }

    // == Set ==
    /// Inserts or overwrites an entry expiring `ttl` from now.
    ///
    /// A zero or negative `ttl` is accepted and stores an already-expired entry.
    pub fn set(&self, key: String, value: String, ttl: Duration) {
        let entry = CacheEntry::new(value, ttl);
        self.entries.write().insert(key, entry);
    }

    // == Delete ==
    /// Removes an entry by key. Deleting an absent key is not an error.
    pub fn delete(&self, key: &str) {
        self.entries.write().remove(key);
    }

    // == Set TTL ==
    /// Refreshes the expiration of an existing key to `ttl` from now.
    pub fn set_ttl(&self, key: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.refresh(ttl);
                Ok(())
            }
            None => Err(CacheError::KeyNotFound(key.to_string())),
        }
    }

    // == Get TTL ==
    /// Returns the remaining TTL, negative if stale but not yet evicted.
    pub fn get_ttl(&self, key: &str) -> Result<Duration> {
        self.entries
            .read()
            .get(key)
            .map(CacheEntry::ttl_remaining)
            .ok_or_else(|| CacheError::KeyNotFound(key.to_string()))
    }

    // == Exists ==
    /// True if the key is present, whether or not it has expired.
    ///
    /// This does not evict, so it can disagree with `get` for stale keys.
    pub fn exists(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    // == Clear ==
    /// Replaces the whole mapping with an empty one.
    pub fn clear(&self) {
        *self.entries.write() = HashMap::new();
    }

    // == Length ==
    /// Returns the number of entries, including stale ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
