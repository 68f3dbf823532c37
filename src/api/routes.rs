//! API Routes
//!
//! Configures the Axum router with all cache endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, description_handler, exists_handler, get_handler,
    get_ttl_handler, health_handler, set_cache_handler, set_handler, set_ttl_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /setcache` - Install a backend (JSON body)
/// - `GET|POST|PUT /set?key&value&ttl` - Store a key-value pair
/// - `GET /get?key` - Retrieve a value
/// - `GET|POST|DELETE /delete?key` - Delete a key
/// - `GET /ttl?key` - Remaining time to live
/// - `POST /setttl?key&ttl` - Refresh a key's expiry
/// - `GET /exists?key` - Presence check
/// - `POST /clear` - Drop every entry
/// - `GET /description` - Describe the active backend
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/setcache", post(set_cache_handler))
        .route("/set", get(set_handler).post(set_handler).put(set_handler))
        .route("/get", get(get_handler))
        .route(
            "/delete",
            get(delete_handler).post(delete_handler).delete(delete_handler),
        )
        .route("/ttl", get(get_ttl_handler))
        .route("/setttl", post(set_ttl_handler))
        .route("/exists", get(exists_handler))
        .route("/clear", post(clear_handler))
        .route("/description", get(description_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        create_router(AppState::new(Arc::new(MemoryCache::new())))
    }

    async fn status_of(app: Router, method: &str, uri: &str) -> StatusCode {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        assert_eq!(status_of(create_test_app(), "GET", "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_set_endpoint_accepts_get_and_post() {
        let app = create_test_app();
        assert_eq!(
            status_of(app.clone(), "GET", "/set?key=a&value=1&ttl=1m").await,
            StatusCode::OK
        );
        assert_eq!(
            status_of(app, "POST", "/set?key=b&value=2&ttl=1m").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_get_not_found_is_server_error() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/get?key=nonexistent").await,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_bad_request() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/get").await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_setcache_requires_post() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/setcache").await,
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
