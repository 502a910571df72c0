//! Driver entity and cache key helpers

use serde::{Deserialize, Serialize};

/// Cache key holding the full driver table snapshot.
pub const DRIVERS_CACHE_KEY: &str = "drivers";

/// A stored driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Driver {
    /// Store-generated primary key
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub driver_number: i32,
}

impl Driver {
    /// Cache key for this driver.
    pub fn cache_key(&self) -> String {
        driver_cache_key(self.id)
    }
}

/// A driver that has not been inserted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDriver {
    pub name: String,
    pub driver_number: i32,
}

/// Per-id cache key, e.g. `driver1`.
pub fn driver_cache_key(id: i64) -> String {
    format!("driver{}", id)
}
