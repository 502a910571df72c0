//! Cache Module
//!
//! Typed TTL cache policy over pluggable key-value backends.

mod backend;
mod entry;
mod memory;
mod redis;
mod service;
mod stats;


// Re-export public types
pub use self::redis::RedisBackend;
pub use backend::CacheBackend;
pub use entry::CacheEntry;
pub use memory::InMemoryBackend;
pub use service::CacheService;
pub use stats::{CacheCounters, CacheStats};
