//! API Handlers
//!
//! HTTP request handlers for each cache endpoint. Every handler borrows the
//! installed backend out of [`AppState`] and releases the lock before calling it.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    Json,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::cache::{connect, connect_strict, BackendConfig, SharedCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    BackendResponse, DeleteResponse, ExistsResponse, GetResponse, HealthResponse, KeyQuery,
    SetCacheRequest, SetQuery, SetResponse, TtlQuery, TtlResponse,
};
use crate::token::CancelToken;

/// Application state shared across all handlers.
///
/// Holds the single backend reachable by every handler. Reassignment goes
/// through the write lock; handlers only hold the read lock long enough to
/// clone the handle.
#[derive(Clone)]
pub struct AppState {
    /// Installed backend, `None` until one is configured
    pub cache: Arc<RwLock<Option<SharedCache>>>,
    /// Defaults for backends installed through /setcache
    pub backend_defaults: BackendConfig,
    /// Deadline applied to each cache call
    pub request_timeout: Duration,
    /// Reject unknown backend tags in /setcache
    pub strict: bool,
    /// Fires when the server begins shutting down; every request token is
    /// derived from it
    pub shutdown_token: CancelToken,
}

impl AppState {
    /// Creates a new AppState with the given backend installed.
    pub fn new(cache: SharedCache) -> Self {
        Self::from_config(&Config::default(), Some(cache))
    }

    /// Creates a new AppState with no backend installed.
    pub fn empty() -> Self {
        Self::from_config(&Config::default(), None)
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config, cache: Option<SharedCache>) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            backend_defaults: config.backend_config(),
            request_timeout: config.request_timeout(),
            strict: config.strict,
            shutdown_token: CancelToken::new(),
        }
    }

    /// Returns the installed backend.
    pub async fn current(&self) -> Result<SharedCache> {
        self.cache
            .read()
            .await
            .clone()
            .ok_or_else(|| CacheError::Internal("Cache not initialized".to_string()))
    }

    /// Installs `cache`, returning the backend it replaces.
    pub async fn replace(&self, cache: SharedCache) -> Option<SharedCache> {
        self.cache.write().await.replace(cache)
    }

    /// Removes and closes the installed backend, if any.
    pub async fn shutdown(&self) -> Result<()> {
        let previous = self.cache.write().await.take();
        match previous {
            Some(cache) => cache.close().await,
            None => Ok(()),
        }
    }

    /// Token bounding a single request's cache call. It fires at the
    /// request deadline or when shutdown begins, whichever comes first.
    pub fn request_token(&self) -> CancelToken {
        self.shutdown_token.child_with_timeout(self.request_timeout)
    }
}

/// Handler for POST /setcache
///
/// Builds a new backend and installs it, closing the previous one.
pub async fn set_cache_handler(
    State(state): State<AppState>,
    Json(req): Json<SetCacheRequest>,
) -> Result<Json<BackendResponse>> {
    let config = req.to_backend_config(&state.backend_defaults);
    let cache = if state.strict {
        connect_strict(&config).await?
    } else {
        connect(&config).await?
    };
    let description = cache.describe();

    if let Some(previous) = state.replace(cache).await {
        if let Err(err) = previous.close().await {
            warn!("Closing replaced backend failed: {}", err);
        }
    }
    info!("Cache initialized: {}", description);

    Ok(Json(BackendResponse::new("Cache initialized", description)))
}

/// Handler for /set?key=..&value=..&ttl=..
pub async fn set_handler(
    State(state): State<AppState>,
    Query(query): Query<SetQuery>,
) -> Result<Json<SetResponse>> {
    let (key, value, ttl) = query.validate().map_err(CacheError::InvalidRequest)?;

    let cache = state.current().await?;
    cache.set(&state.request_token(), key, value, ttl).await?;

    Ok(Json(SetResponse::new(key, value)))
}

/// Handler for GET /get?key=..
pub async fn get_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<GetResponse>> {
    let key = query.require_key().map_err(CacheError::InvalidRequest)?;

    let cache = state.current().await?;
    let value = cache.get(&state.request_token(), key).await?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for /delete?key=..
pub async fn delete_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<DeleteResponse>> {
    let key = query.require_key().map_err(CacheError::InvalidRequest)?;

    let cache = state.current().await?;
    cache.delete(&state.request_token(), key).await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /ttl?key=..
pub async fn get_ttl_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<TtlResponse>> {
    let key = query.require_key().map_err(CacheError::InvalidRequest)?;

    let cache = state.current().await?;
    let ttl = cache.get_ttl(&state.request_token(), key).await?;

    Ok(Json(TtlResponse::new(key, ttl)))
}

/// Handler for /setttl?key=..&ttl=..
pub async fn set_ttl_handler(
    State(state): State<AppState>,
    Query(query): Query<TtlQuery>,
) -> Result<Json<TtlResponse>> {
    let (key, ttl) = query.validate().map_err(CacheError::InvalidRequest)?;

    let cache = state.current().await?;
    cache.set_ttl(&state.request_token(), key, ttl).await?;

    Ok(Json(TtlResponse::new(key, ttl)))
}

/// Handler for GET /exists?key=..
pub async fn exists_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<ExistsResponse>> {
    let key = query.require_key().map_err(CacheError::InvalidRequest)?;

    let cache = state.current().await?;
    let exists = cache.exists(&state.request_token(), key).await?;

    Ok(Json(ExistsResponse::new(key, exists)))
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<BackendResponse>> {
    let cache = state.current().await?;
    cache.clear(&state.request_token()).await?;

    Ok(Json(BackendResponse::new("Cache cleared", cache.describe())))
}

/// Handler for GET /description
pub async fn description_handler(State(state): State<AppState>) -> Result<Json<BackendResponse>> {
    let cache = state.current().await?;
    Ok(Json(BackendResponse::new("ok", cache.describe())))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let initialized = state.cache.read().await.is_some();
    Json(HealthResponse::healthy(initialized))
}
