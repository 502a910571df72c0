//! Cache Service Module
//!
//! Typed cache policy over a `CacheBackend`: values are stored as JSON text
//! with an absolute expiry.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::{CacheBackend, CacheCounters, CacheStats};
use crate::error::Result;

// == Cache Service ==
/// Typed get/set/remove with expiration over a shared backend.
///
/// Cloning is cheap; clones share the backend and the counters.
#[derive(Clone)]
pub struct CacheService {
    backend: Arc<dyn CacheBackend>,
    counters: Arc<CacheCounters>,
}

impl CacheService {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            counters: Arc::new(CacheCounters::default()),
        }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    // == Get ==
    /// Looks up `key` and decodes it as `T`.
    ///
    /// Absent or empty values are a miss. A payload that fails to decode is
    /// also a miss; the next `set` on the key overwrites it.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = match self.backend.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                self.counters.record_error();
                return Err(e);
            }
        };

        let Some(raw) = raw.filter(|v| !v.is_empty()) else {
            debug!(key, "cache miss");
            self.counters.record_miss();
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key, "cache hit");
                self.counters.record_hit();
                Ok(Some(value))
            }
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cache payload");
                self.counters.record_miss();
                Ok(None)
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key` until `expiry`.
    ///
    /// An expiry at or before now stores nothing, evicts any existing entry
    /// and returns `false`. Otherwise returns whether the backend accepted the write.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        expiry: DateTime<Utc>,
    ) -> Result<bool> {
        let ttl = expiry
            .signed_duration_since(Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let payload = serde_json::to_string(value)?;

        let accepted = match self.backend.set(key, payload, ttl).await {
            Ok(accepted) => accepted,
            Err(e) => {
                self.counters.record_error();
                return Err(e);
            }
        };

        if accepted {
            debug!(key, ttl_ms = ttl.as_millis() as u64, "cache set");
            self.counters.record_set();
        } else {
            debug!(key, "cache set rejected, expiry already passed");
        }
        Ok(accepted)
    }

    /// Stores `value` under `key` for `ttl` from now.
    pub async fn set_with_ttl<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<bool> {
        let expiry = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.set(key, value, expiry).await
    }

    // == Remove ==
    /// Removes `key`.
    ///
    /// `false` means nothing was removed, whether the key was absent or the
    /// backend reported no deletion.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        match self.backend.delete(key).await {
            Ok(removed) => {
                if removed {
                    debug!(key, "cache entry removed");
                    self.counters.record_removal();
                }
                Ok(removed)
            }
            Err(e) => {
                self.counters.record_error();
                Err(e)
            }
        }
    }

    // == Contains ==
    pub async fn contains(&self, key: &str) -> Result<bool> {
        self.backend.exists(key).await
    }

    // == Stats ==
    /// Returns a snapshot of the policy counters.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}
