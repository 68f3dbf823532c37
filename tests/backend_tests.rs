//! Backend Contract Tests
//!
//! Drives each backend through the shared `Cache` trait, the way callers
//! outside the crate see it.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use mini_cache::cache::MemoryCache;
use mini_cache::{
    connect, connect_strict, BackendConfig, Cache, CacheError, CancelToken, SharedCache,
};
use tokio_test::{assert_err, assert_ok};

// == Helper Functions ==

async fn memory() -> SharedCache {
    assert_ok!(connect(&BackendConfig::new("in-memory")).await)
}

// == Expiry Scenario ==

#[tokio::test(start_paused = true)]
async fn test_key_expires_after_ttl() {
    let cache = memory().await;
    let token = CancelToken::new();

    assert_ok!(cache.set(&token, "k1", "v1", Duration::seconds(3)).await);

    let value = assert_ok!(cache.get(&token, "k1").await);
    assert_eq!(value.as_deref(), Some("v1"));

    let ttl = assert_ok!(cache.get_ttl(&token, "k1").await);
    assert!(ttl > Duration::zero() && ttl <= Duration::seconds(3));

    tokio::time::sleep(StdDuration::from_secs(5)).await;

    let err = assert_err!(cache.get(&token, "k1").await);
    assert_eq!(err, CacheError::KeyExpired("k1".to_string()));

    // The expired read evicted the entry
    let err = assert_err!(cache.get_ttl(&token, "k1").await);
    assert_eq!(err, CacheError::KeyNotFound("k1".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_set_ttl_extends_life() {
    let cache = memory().await;
    let token = CancelToken::new();

    assert_ok!(cache.set(&token, "k", "v", Duration::seconds(1)).await);
    assert_ok!(cache.set_ttl(&token, "k", Duration::minutes(1)).await);

    tokio::time::sleep(StdDuration::from_secs(10)).await;

    let value = assert_ok!(cache.get(&token, "k").await);
    assert_eq!(value.as_deref(), Some("v"));
}

#[tokio::test]
async fn test_missing_key_reports_not_found() {
    let cache = memory().await;
    let token = CancelToken::new();

    let err = assert_err!(cache.get(&token, "never").await);
    assert!(err.is_miss());
    assert_err!(cache.set_ttl(&token, "never", Duration::seconds(1)).await);
    assert!(!assert_ok!(cache.exists(&token, "never").await));
    // Deleting an absent key is fine
    assert_ok!(cache.delete(&token, "never").await);
}

#[tokio::test]
async fn test_clear_removes_everything() {
    let cache = memory().await;
    let token = CancelToken::new();

    for key in ["a", "b", "c"] {
        assert_ok!(cache.set(&token, key, "v", Duration::minutes(1)).await);
    }
    assert_ok!(cache.clear(&token).await);

    for key in ["a", "b", "c"] {
        assert!(!assert_ok!(cache.exists(&token, key).await));
    }
}

// == Cancellation ==

#[tokio::test]
async fn test_fired_token_leaves_store_untouched() {
    let cache = MemoryCache::new();
    let live = CancelToken::new();
    assert_ok!(cache.set(&live, "k", "before", Duration::minutes(1)).await);

    let expired = CancelToken::with_deadline(tokio::time::Instant::now());
    let err = assert_err!(cache.set(&expired, "k", "after", Duration::minutes(1)).await);
    assert_eq!(err, CacheError::Cancelled);

    let cancelled = CancelToken::new();
    cancelled.cancel();
    let err = assert_err!(cache.delete(&cancelled, "k").await);
    assert_eq!(err, CacheError::Cancelled);

    assert_eq!(cache.store().get("k"), Ok("before".to_string()));
}

// == Factory ==

#[tokio::test]
async fn test_factory_variants() {
    let cache = memory().await;
    assert!(cache.describe().starts_with("MemoryCache"));

    for tag in ["", "noop", "memcached"] {
        let cache = assert_ok!(connect(&BackendConfig::new(tag)).await);
        assert!(cache.describe().starts_with("NoopCache"), "tag {:?}", tag);
    }

    let err = assert_err!(connect_strict(&BackendConfig::new("memcached")).await);
    assert!(matches!(err, CacheError::InvalidConfiguration(_)));
}

#[tokio::test]
async fn test_factory_unreachable_remote() {
    let config = BackendConfig {
        address: "127.0.0.1:1".to_string(),
        connect_timeout: StdDuration::from_millis(500),
        ..BackendConfig::new("remote")
    };

    let err = assert_err!(connect(&config).await);
    assert!(matches!(err, CacheError::BackendUnavailable(_)));
}

#[tokio::test]
async fn test_noop_contract() {
    let cache = assert_ok!(connect(&BackendConfig::new("noop")).await);
    let token = CancelToken::new();

    assert_ok!(cache.set(&token, "k", "v", Duration::minutes(1)).await);
    assert_eq!(assert_ok!(cache.get(&token, "k").await), None);
    assert!(!assert_ok!(cache.exists(&token, "k").await));
    assert_eq!(assert_ok!(cache.get_ttl(&token, "k").await), Duration::zero());
    assert_ok!(cache.set_ttl(&token, "k", Duration::seconds(1)).await);
    assert_ok!(cache.delete(&token, "k").await);
    assert_ok!(cache.clear(&token).await);
    assert_ok!(cache.close().await);
}

// == Concurrency ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_share_one_backend() {
    let cache = memory().await;

    let mut handles = Vec::new();
    for i in 0..32 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            let token = CancelToken::new();
            let key = format!("key_{}", i % 4);
            cache
                .set(&token, &key, &format!("value_{}", i), Duration::minutes(1))
                .await
        }));
    }
    for handle in handles {
        assert_ok!(handle.await.unwrap());
    }

    let token = CancelToken::new();
    for k in 0..4 {
        let key = format!("key_{}", k);
        let value = assert_ok!(cache.get(&token, &key).await).unwrap();
        let written: Vec<String> = (0..32)
            .filter(|i| i % 4 == k)
            .map(|i| format!("value_{}", i))
            .collect();
        assert!(written.contains(&value), "{} held {}", key, value);
    }
}
