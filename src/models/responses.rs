//! Response DTOs for the driver API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Name of the active cache backend
    pub backend: String,
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of accepted writes
    pub sets: u64,
    /// Number of removed keys
    pub removals: u64,
    /// Number of backend failures
    pub errors: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Whether a live collection snapshot is currently cached
    pub collection_cached: bool,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(backend: impl Into<String>, stats: &CacheStats, collection_cached: bool) -> Self {
        Self {
            backend: backend.into(),
            hits: stats.hits,
            misses: stats.misses,
            sets: stats.sets,
            removals: stats.removals,
            errors: stats.errors,
            hit_rate: stats.hit_rate(),
            collection_cached,
        }
    }
}

/// Reachability of one dependency
#[derive(Debug, Clone, Serialize)]
pub struct DependencyStatus {
    pub name: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DependencyStatus {
    pub fn from_check(name: impl Into<String>, check: crate::error::Result<()>) -> Self {
        Self {
            name: name.into(),
            healthy: check.is_ok(),
            error: check.err().map(|e| e.to_string()),
        }
    }
}

/// Response body for the health endpoint (GET /health)
///
/// `status` is `healthy` when every dependency answers, `degraded` otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub store: DependencyStatus,
    pub cache: DependencyStatus,
}

impl HealthResponse {
    pub fn new(store: DependencyStatus, cache: DependencyStatus) -> Self {
        let status = if store.healthy && cache.healthy {
            "healthy"
        } else {
            "degraded"
        };
        Self {
            status: status.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            store,
            cache,
        }
    }
}
