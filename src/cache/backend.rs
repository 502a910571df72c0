//! Cache Backend Module
//!
//! The raw key-value contract every cache backend implements.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

// == Cache Backend ==
/// Key-value store with per-key expiration.
///
/// Values are opaque strings; typed encoding lives in `CacheService`.
/// Errors from any method mean the backend could not be reached.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns the value under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key` for `ttl`. Returns whether the write was accepted.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<bool>;

    /// Returns true if a live entry exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Deletes `key`. Returns true only if an entry was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Verifies the backend is reachable.
    async fn ping(&self) -> Result<()>;

    /// Re-establishes the connection after a failure. No-op for in-process backends.
    async fn reconnect(&self) -> Result<()> {
        Ok(())
    }

    /// Releases backend resources. Called once during shutdown.
    async fn shutdown(&self) {}

    /// Short name used in logs and health output.
    fn name(&self) -> &'static str;
}
