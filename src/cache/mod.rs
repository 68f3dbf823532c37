//! Cache Module
//!
//! Key-value caching behind one contract with interchangeable backends:
//! an in-memory store with lazy TTL expiry, a no-op backend and Redis.

mod backend;
mod entry;
mod guard;
mod memory;
mod noop;
mod remote;
mod store;


// Re-export public types
pub use backend::{
    connect, connect_strict, BackendConfig, BackendKind, Cache, SharedCache,
    DEFAULT_CONNECT_TIMEOUT,
};
pub use entry::CacheEntry;
pub use memory::MemoryCache;
pub use noop::NoopCache;
pub use remote::RedisCache;
pub use store::EntryStore;
