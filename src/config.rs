//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Cache URL value selecting the in-process backend.
pub const MEMORY_CACHE_URL: &str = "memory";

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// SQLite connection URL
    pub database_url: String,
    /// Maximum pooled database connections
    pub database_max_connections: u32,
    /// Redis URL, or `memory` for the in-process backend
    pub cache_url: String,
    /// TTL in seconds for cached drivers
    pub cache_ttl: u64,
    /// In-memory backend cleanup interval in seconds
    pub cleanup_interval: u64,
    /// Evict the collection entry on create and delete as well
    pub invalidate_collection_on_write: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DATABASE_URL` - SQLite URL (default: `sqlite::memory:`)
    /// - `DATABASE_MAX_CONNECTIONS` - Pool size (default: 5)
    /// - `CACHE_URL` - Redis URL or `memory` (default: `redis://localhost:6379`)
    /// - `CACHE_TTL` - Driver entry TTL in seconds (default: 30)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `INVALIDATE_COLLECTION_ON_WRITE` - `true`/`false` (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: env_or(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            cache_url: env::var("CACHE_URL").unwrap_or(defaults.cache_url),
            cache_ttl: env_or("CACHE_TTL", defaults.cache_ttl),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            invalidate_collection_on_write: env_or(
                "INVALIDATE_COLLECTION_ON_WRITE",
                defaults.invalidate_collection_on_write,
            ),
        }
    }

    /// TTL applied to driver entries.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Whether the in-process cache backend is selected.
    pub fn uses_memory_cache(&self) -> bool {
        self.cache_url.eq_ignore_ascii_case(MEMORY_CACHE_URL)
    }

    /// Whether the database lives only inside its connection.
    ///
    /// Each SQLite in-memory connection is a separate database, so the pool
    /// must be limited to one connection.
    pub fn uses_memory_database(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 5,
            cache_url: "redis://localhost:6379".to_string(),
            cache_ttl: 30,
            cleanup_interval: 1,
            invalidate_collection_on_write: false,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
