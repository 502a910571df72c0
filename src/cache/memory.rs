//! In-Memory Backend Module
//!
//! Process-local cache backend: a HashMap of entries with TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::entry::ttl_millis;
use crate::cache::{CacheBackend, CacheEntry};
use crate::error::Result;

// == In-Memory Backend ==
/// Cache backend holding entries in process memory.
///
/// Expired entries read as absent and are dropped lazily on access;
/// `cleanup_expired` sweeps the rest.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    /// Key-value storage
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryBackend {
    // == Constructor ==
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    // == Is Empty ==
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: drop it unless a fresh value replaced it in between
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(CacheEntry::is_expired) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<bool> {
        let mut entries = self.entries.write().await;
        if ttl_millis(ttl) == 0 {
            entries.remove(key);
            return Ok(false);
        }

        entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        Ok(true)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).is_some_and(|entry| !entry.is_expired()))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        Ok(entries
            .remove(key)
            .is_some_and(|entry| !entry.is_expired()))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn test_backend_new() {
        let backend = InMemoryBackend::new();
        assert_eq!(backend.len().await, 0);
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let backend = InMemoryBackend::new();

        assert!(backend.set("key1", "value1".to_string(), TTL).await.unwrap());
        let value = backend.get("key1").await.unwrap();

        assert_eq!(value.as_deref(), Some("value1"));
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let backend = InMemoryBackend::new();
        assert!(backend.get("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_resets_value() {
        let backend = InMemoryBackend::new();

        backend.set("key1", "value1".to_string(), TTL).await.unwrap();
        backend.set("key1", "value2".to_string(), TTL).await.unwrap();

        assert_eq!(backend.get("key1").await.unwrap().as_deref(), Some("value2"));
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let backend = InMemoryBackend::new();

        backend.set("key1", "value1".to_string(), TTL).await.unwrap();
        assert!(backend.delete("key1").await.unwrap());

        assert!(backend.is_empty().await);
        assert!(!backend.exists("key1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_nonexistent() {
        let backend = InMemoryBackend::new();
        assert!(!backend.delete("nonexistent").await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_ttl_is_rejected_and_evicts() {
        let backend = InMemoryBackend::new();

        backend.set("key1", "value1".to_string(), TTL).await.unwrap();
        let accepted = backend.set("key1", "value2".to_string(), Duration::ZERO).await.unwrap();

        assert!(!accepted);
        assert!(backend.get("key1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sub_millisecond_ttl_is_served() {
        let backend = InMemoryBackend::new();

        let accepted = backend
            .set("key1", "value1".to_string(), Duration::from_micros(900))
            .await
            .unwrap();

        assert!(accepted);
        assert_eq!(backend.get("key1").await.unwrap().as_deref(), Some("value1"));
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", "value1".to_string(), Duration::from_millis(100))
            .await
            .unwrap();
        assert!(backend.exists("key1").await.unwrap());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(!backend.exists("key1").await.unwrap());
        assert!(backend.get("key1").await.unwrap().is_none());
        // Lazy removal on read
        assert_eq!(backend.len().await, 0);
    }

    #[tokio::test]
    async fn test_delete_expired_reports_not_removed() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", "value1".to_string(), Duration::from_millis(50))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!backend.delete("key1").await.unwrap());
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", "value1".to_string(), Duration::from_millis(100))
            .await
            .unwrap();
        backend.set("key2", "value2".to_string(), TTL).await.unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        let removed = backend.cleanup_expired().await;
        assert_eq!(removed, 1);
        assert_eq!(backend.len().await, 1);
        assert!(backend.exists("key2").await.unwrap());
    }
}
