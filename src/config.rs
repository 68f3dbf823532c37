//! Configuration Module
//!
//! Server configuration from command-line flags, falling back to environment
//! variables and then to defaults.

use std::time::Duration;

use clap::Parser;

use crate::cache::BackendConfig;

/// Server configuration parameters.
#[derive(Debug, Clone, Parser)]
#[command(name = "mini_cache", about = "Key-value cache server with pluggable backends")]
pub struct Config {
    /// HTTP server port
    #[arg(long, env = "SERVER_PORT", default_value_t = 8080)]
    pub server_port: u16,

    /// Backend installed at startup (in-memory, remote; anything else is no-op)
    #[arg(long, env = "CACHE_TYPE", default_value = "")]
    pub cache_type: String,

    /// Remote server address (host:port)
    #[arg(long, env = "CACHE_ADDR", default_value = "localhost:6379")]
    pub cache_addr: String,

    /// Remote server password
    #[arg(long, env = "CACHE_PASSWORD", default_value = "", hide_env_values = true)]
    pub cache_password: String,

    /// Remote database selected after connecting
    #[arg(long, env = "CACHE_DB", default_value_t = 0)]
    pub cache_db: i64,

    /// Time allowed for connecting to a remote backend, in milliseconds
    #[arg(long, env = "CONNECT_TIMEOUT_MS", default_value_t = 5000)]
    pub connect_timeout_ms: u64,

    /// Deadline for each cache call made by a request handler, in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 2000)]
    pub request_timeout_ms: u64,

    /// Reject unknown backend tags instead of falling back to no-op
    #[arg(long, env = "CACHE_STRICT", default_value_t = false)]
    pub strict: bool,
}

impl Config {
    /// Backend parameters for the startup backend.
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            kind: self.cache_type.clone(),
            address: self.cache_addr.clone(),
            password: self.cache_password.clone(),
            db: self.cache_db,
            connect_timeout: self.connect_timeout(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            cache_type: String::new(),
            cache_addr: "localhost:6379".to_string(),
            cache_password: String::new(),
            cache_db: 0,
            connect_timeout_ms: 5000,
            request_timeout_ms: 2000,
            strict: false,
        }
    }
}
