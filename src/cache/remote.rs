//! Redis backend.
//!
//! Wraps a `redis` connection manager, which reconnects on its own after
//! dropped connections. Replies are mapped onto the cache error taxonomy:
//! a nil `GET`, a zero `PEXPIRE` and a negative `PTTL` all mean the key is
//! missing.

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use parking_lot::Mutex;
use redis::aio::ConnectionManager;
use redis::{Cmd, FromRedisValue};
use tracing::debug;

use crate::cache::Cache;
use crate::error::{CacheError, Result};
use crate::token::CancelToken;

/// Cache backed by a Redis server.
pub struct RedisCache {
    /// `None` once closed
    conn: Mutex<Option<ConnectionManager>>,
}

impl RedisCache {
    /// Connects to `address` and verifies the connection with `PING`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::BackendUnavailable` if the connection or the
    /// handshake fails, or does not finish within `timeout`.
    pub async fn connect(
        address: &str,
        password: &str,
        db: i64,
        timeout: StdDuration,
    ) -> Result<Self> {
        let url = connection_url(address, password, db);
        let client = redis::Client::open(url.as_str()).map_err(|err| {
            CacheError::BackendUnavailable(format!("invalid address {}: {}", address, err))
        })?;

        let handshake = async {
            let mut conn = ConnectionManager::new(client).await?;
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, redis::RedisError>(conn)
        };

        match tokio::time::timeout(timeout, handshake).await {
            Ok(Ok(conn)) => Ok(Self {
                conn: Mutex::new(Some(conn)),
            }),
            Ok(Err(err)) => Err(CacheError::BackendUnavailable(format!(
                "failed to connect to {}: {}",
                address, err
            ))),
            Err(_) => Err(CacheError::BackendUnavailable(format!(
                "timed out connecting to {} after {:?}",
                address, timeout
            ))),
        }
    }

    fn connection(&self) -> Result<ConnectionManager> {
        self.conn
            .lock()
            .clone()
            .ok_or_else(|| CacheError::BackendUnavailable("connection closed".to_string()))
    }

    /// Sends `cmd`, giving up as soon as `token` fires.
    async fn query<T>(&self, token: &CancelToken, cmd: Cmd) -> Result<T>
    where
        T: FromRedisValue + Send,
    {
        token.check()?;
        let mut conn = self.connection()?;

        let reply = async move {
            let reply: redis::RedisResult<T> = cmd.query_async(&mut conn).await;
            reply
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(CacheError::Cancelled),
            reply = reply => reply.map_err(map_redis_error),
        }
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, token: &CancelToken, key: &str) -> Result<Option<String>> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        let value: Option<String> = self.query(token, cmd).await?;
        match value {
            Some(value) => Ok(Some(value)),
            None => Err(CacheError::KeyNotFound(key.to_string())),
        }
    }

    async fn set(
        &self,
        token: &CancelToken,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<()> {
        let millis = ttl_millis(ttl);
        if millis <= 0 {
            // An already-expired write leaves nothing readable behind
            return self.delete(token, key).await;
        }

        let mut cmd = redis::cmd("PSETEX");
        cmd.arg(key).arg(millis).arg(value);
        let _: () = self.query(token, cmd).await?;
        Ok(())
    }

    async fn delete(&self, token: &CancelToken, key: &str) -> Result<()> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);
        let _: i64 = self.query(token, cmd).await?;
        Ok(())
    }

    async fn set_ttl(&self, token: &CancelToken, key: &str, ttl: Duration) -> Result<()> {
        // PEXPIRE with a non-positive value deletes the key, matching an
        // already-expired entry.
        let mut cmd = redis::cmd("PEXPIRE");
        cmd.arg(key).arg(ttl_millis(ttl));
        let updated: i64 = self.query(token, cmd).await?;
        if updated == 0 {
            return Err(CacheError::KeyNotFound(key.to_string()));
        }
        Ok(())
    }

    async fn get_ttl(&self, token: &CancelToken, key: &str) -> Result<Duration> {
        let mut cmd = redis::cmd("PTTL");
        cmd.arg(key);
        let millis: i64 = self.query(token, cmd).await?;
        // -2: no such key, -1: key without expiry
        if millis < 0 {
            return Err(CacheError::KeyNotFound(key.to_string()));
        }
        Ok(Duration::milliseconds(millis))
    }

    async fn exists(&self, token: &CancelToken, key: &str) -> Result<bool> {
        let mut cmd = redis::cmd("EXISTS");
        cmd.arg(key);
        let count: i64 = self.query(token, cmd).await?;
        Ok(count > 0)
    }

    async fn clear(&self, token: &CancelToken) -> Result<()> {
        let _: () = self.query(token, redis::cmd("FLUSHDB")).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let previous = self.conn.lock().take();
        match previous {
            Some(_) => {
                debug!("Redis connection closed");
                Ok(())
            }
            None => Err(CacheError::BackendUnavailable(
                "connection already closed".to_string(),
            )),
        }
    }

    fn describe(&self) -> &'static str {
        "RedisCache: a Redis-backed cache"
    }
}

/// Whole milliseconds for a PSETEX/PEXPIRE argument. Positive TTLs round
/// up so a sub-millisecond TTL still keeps the key alive.
pub(crate) fn ttl_millis(ttl: Duration) -> i64 {
    let millis = ttl.num_milliseconds();
    if ttl > Duration::milliseconds(millis) {
        millis + 1
    } else {
        millis
    }
}

/// Builds a `redis://` URL from its parts. Addresses that already carry a
/// scheme are used verbatim.
pub(crate) fn connection_url(address: &str, password: &str, db: i64) -> String {
    if address.contains("://") {
        return address.to_string();
    }
    if password.is_empty() {
        format!("redis://{}/{}", address, db)
    } else {
        format!(
            "redis://:{}@{}/{}",
            urlencoding::encode(password),
            address,
            db
        )
    }
}

/// Maps Redis errors to CacheError.
fn map_redis_error(err: redis::RedisError) -> CacheError {
    if err.is_connection_refusal() || err.is_timeout() || err.is_connection_dropped() {
        CacheError::BackendUnavailable(err.to_string())
    } else {
        CacheError::Backend(err.to_string())
    }
}
