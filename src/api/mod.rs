//! API Module
//!
//! HTTP handlers and routing exposing the active cache backend.
//!
//! # Endpoints
//! - `POST /setcache` - Install a backend
//! - `/set`, `/get`, `/delete`, `/ttl`, `/setttl`, `/exists` - Key operations
//!   driven by the `key`, `value` and `ttl` query parameters
//! - `POST /clear` - Drop every entry
//! - `GET /description` - Describe the active backend
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
