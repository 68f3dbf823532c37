//! Mini Cache - A key-value cache with interchangeable backends
//!
//! One contract ([`cache::Cache`]) over an in-memory store with lazy TTL
//! expiry, a no-op backend and Redis, plus an HTTP surface exposing it.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod token;

pub use api::AppState;
pub use cache::{connect, connect_strict, BackendConfig, BackendKind, Cache, SharedCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use token::CancelToken;
