//! Mini Cache - HTTP server
//!
//! Exposes the active cache backend over HTTP. A backend can be installed at
//! startup (`--cache-type`) or later through `POST /setcache`.

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_cache::api::{create_router, AppState};
use mini_cache::{connect, connect_strict, CancelToken, Config};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from flags and environment variables
/// 3. Install the startup backend, if one is configured
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. On SIGINT/SIGTERM, stop serving and close the backend once
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mini Cache server");

    let config = Config::parse();
    info!(
        "Configuration loaded: port={}, cache_type={:?}, request_timeout={}ms",
        config.server_port, config.cache_type, config.request_timeout_ms
    );

    let cache = if config.cache_type.is_empty() {
        info!("No startup backend; waiting for POST /setcache");
        None
    } else {
        let backend = config.backend_config();
        let connected = if config.strict {
            connect_strict(&backend).await
        } else {
            connect(&backend).await
        };
        let cache = connected
            .with_context(|| format!("could not initialize cache '{}'", config.cache_type))?;
        info!("Cache initialized: {}", cache.describe());
        Some(cache)
    };

    let state = AppState::from_config(&config, cache);
    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.shutdown_token.clone()))
        .await
        .context("server error")?;

    if let Err(err) = state.shutdown().await {
        warn!("Closing cache failed: {}", err);
    }
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then cancels `token` so
/// in-flight cache calls stop waiting.
async fn shutdown_signal(token: CancelToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
    token.cancel();
}
