//! Driver Service
//!
//! Read-through caching in front of the driver store. Reads try the cache
//! first and repopulate it on a miss; writes go to the store and then set or
//! evict the matching cache entry. Cache and store are not updated
//! atomically; the TTL bounds how long they can disagree.
//!
//! A cache backend failure never fails a request: it is logged and the
//! request continues against the store alone.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::CacheService;
use crate::error::{AppError, Result};
use crate::models::{driver_cache_key, CreateDriverRequest, Driver, DRIVERS_CACHE_KEY};
use crate::store::DriverStore;

/// Driver operations with the cache policy applied.
#[derive(Clone)]
pub struct DriverService {
    store: Arc<dyn DriverStore>,
    cache: CacheService,
    ttl: Duration,
    invalidate_collection_on_write: bool,
}

impl DriverService {
    /// Creates a service caching entries for `ttl`.
    pub fn new(store: Arc<dyn DriverStore>, cache: CacheService, ttl: Duration) -> Self {
        Self {
            store,
            cache,
            ttl,
            invalidate_collection_on_write: false,
        }
    }

    /// Also evict the collection entry whenever a driver is created or deleted.
    pub fn with_collection_invalidation(mut self, enabled: bool) -> Self {
        self.invalidate_collection_on_write = enabled;
        self
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn DriverStore> {
        &self.store
    }

    // == List ==
    /// Returns all drivers.
    ///
    /// A cached collection is used only when non-empty, so an empty table is
    /// re-read from the store on every call.
    pub async fn list(&self) -> Result<Vec<Driver>> {
        match self.cache.get::<Vec<Driver>>(DRIVERS_CACHE_KEY).await {
            Ok(Some(drivers)) if !drivers.is_empty() => return Ok(drivers),
            Ok(_) => {}
            Err(e) => degrade("list", DRIVERS_CACHE_KEY, &e),
        }

        let drivers = self.store.list().await?;
        self.cache_put(DRIVERS_CACHE_KEY, &drivers).await;
        Ok(drivers)
    }

    // == Get ==
    /// Returns one driver, reading through the per-id entry.
    pub async fn get(&self, id: i64) -> Result<Driver> {
        let key = driver_cache_key(id);
        match self.cache.get::<Driver>(&key).await {
            Ok(Some(driver)) => return Ok(driver),
            Ok(None) => {}
            Err(e) => degrade("get", &key, &e),
        }

        let driver = self.store.find_by_id(id).await?.ok_or_else(|| not_found(id))?;
        self.cache_put(&key, &driver).await;
        Ok(driver)
    }

    // == Create ==
    /// Inserts a driver and caches it under its per-id key.
    ///
    /// The cache entry is written from the inserted row before commit; if the
    /// commit fails the entry is evicted again.
    pub async fn create(&self, request: CreateDriverRequest) -> Result<Driver> {
        if let Some(msg) = request.validate() {
            return Err(AppError::InvalidRequest(msg));
        }

        let mut uow = self.store.begin().await?;
        let driver = uow.insert(request.into_new_driver()).await?;
        let key = driver.cache_key();

        self.cache_put(&key, &driver).await;
        if self.invalidate_collection_on_write {
            self.cache_evict(DRIVERS_CACHE_KEY).await;
        }

        if let Err(e) = uow.commit().await {
            self.cache_evict(&key).await;
            return Err(e);
        }

        info!(id = driver.id, "driver created");
        Ok(driver)
    }

    // == Delete ==
    /// Deletes a driver and evicts its per-id entry.
    ///
    /// Existence is resolved before any write, so deleting an unknown id
    /// never reaches the store's delete.
    pub async fn delete(&self, id: i64) -> Result<()> {
        if self.store.find_by_id(id).await?.is_none() {
            return Err(not_found(id));
        }

        let mut uow = self.store.begin().await?;
        if !uow.delete(id).await? {
            // Removed concurrently between lookup and delete
            return Err(not_found(id));
        }

        self.cache_evict(&driver_cache_key(id)).await;
        if self.invalidate_collection_on_write {
            self.cache_evict(DRIVERS_CACHE_KEY).await;
        }

        uow.commit().await?;
        info!(id, "driver deleted");
        Ok(())
    }

    async fn cache_put<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.set_with_ttl(key, value, self.ttl).await {
            degrade("set", key, &e);
        }
    }

    async fn cache_evict(&self, key: &str) {
        if let Err(e) = self.cache.remove(key).await {
            degrade("remove", key, &e);
        }
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Driver {} not found", id))
}

fn degrade(operation: &str, key: &str, err: &AppError) {
    warn!(operation, key, error = %err, "cache unavailable, continuing without cache");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheBackend, InMemoryBackend};
    use crate::models::NewDriver;
    use crate::store::{DriverUnitOfWork, SqliteDriverStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store wrapper counting calls that reach the store.
    struct CountingStore {
        inner: SqliteDriverStore,
        lists: AtomicUsize,
        finds: AtomicUsize,
        begins: AtomicUsize,
    }

    #[async_trait]
    impl DriverStore for CountingStore {
        async fn list(&self) -> Result<Vec<Driver>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            self.inner.list().await
        }
        async fn find_by_id(&self, id: i64) -> Result<Option<Driver>> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_id(id).await
        }
        async fn begin(&self) -> Result<Box<dyn DriverUnitOfWork>> {
            self.begins.fetch_add(1, Ordering::SeqCst);
            self.inner.begin().await
        }
        async fn health_check(&self) -> Result<()> {
            self.inner.health_check().await
        }
        async fn close(&self) {
            self.inner.close().await
        }
    }

    struct Fixture {
        service: DriverService,
        store: Arc<CountingStore>,
        backend: Arc<InMemoryBackend>,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(CountingStore {
            inner: SqliteDriverStore::connect_with("sqlite::memory:", 1)
                .await
                .unwrap(),
            lists: AtomicUsize::new(0),
            finds: AtomicUsize::new(0),
            begins: AtomicUsize::new(0),
        });
        let backend = Arc::new(InMemoryBackend::new());
        let service = DriverService::new(
            store.clone(),
            CacheService::new(backend.clone()),
            Duration::from_secs(30),
        );
        Fixture {
            service,
            store,
            backend,
        }
    }

    fn request(name: &str) -> CreateDriverRequest {
        CreateDriverRequest {
            name: name.to_string(),
            driver_number: 0,
        }
    }

    #[tokio::test]
    async fn test_create_caches_per_id_entry() {
        let f = fixture().await;

        let driver = f.service.create(request("A")).await.unwrap();

        assert_eq!(driver.id, 1);
        let cached: Option<Driver> = f.service.cache().get("driver1").await.unwrap();
        assert_eq!(cached, Some(driver));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_request() {
        let f = fixture().await;

        let result = f.service.create(request("")).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
        assert_eq!(f.store.begins.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_list_populates_then_serves_from_cache() {
        let f = fixture().await;
        let driver = f.service.create(request("A")).await.unwrap();

        let first = f.service.list().await.unwrap();
        let second = f.service.list().await.unwrap();

        assert_eq!(first, vec![driver]);
        assert_eq!(second, first);
        assert_eq!(f.store.lists.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_collection_always_refetches() {
        let f = fixture().await;

        assert!(f.service.list().await.unwrap().is_empty());
        assert!(f.service.list().await.unwrap().is_empty());

        assert_eq!(f.store.lists.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_collection_stays_stale_after_delete() {
        let f = fixture().await;
        f.service.create(request("A")).await.unwrap();
        f.service.create(request("B")).await.unwrap();
        f.service.list().await.unwrap();

        f.service.delete(1).await.unwrap();

        // Only the per-id key is evicted; the snapshot lapses on its own TTL
        assert_eq!(f.service.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_collection_invalidation_on_write() {
        let mut f = fixture().await;
        f.service = f.service.clone().with_collection_invalidation(true);
        f.service.create(request("A")).await.unwrap();
        f.service.create(request("B")).await.unwrap();
        f.service.list().await.unwrap();

        f.service.delete(1).await.unwrap();

        let drivers = f.service.list().await.unwrap();
        assert_eq!(drivers.len(), 1);
        assert_eq!(drivers[0].name, "B");
    }

    #[tokio::test]
    async fn test_delete_evicts_per_id_entry() {
        let f = fixture().await;
        f.service.create(request("A")).await.unwrap();

        f.service.delete(1).await.unwrap();

        let cached: Option<Driver> = f.service.cache().get("driver1").await.unwrap();
        assert!(cached.is_none());
        assert!(f.store.inner.find_by_id(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_unknown_id_skips_store_delete() {
        let f = fixture().await;

        let result = f.service.delete(42).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(f.store.finds.load(Ordering::SeqCst), 1);
        assert_eq!(f.store.begins.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_get_reads_through() {
        let f = fixture().await;
        let mut uow = f.store.inner.begin().await.unwrap();
        let inserted = uow
            .insert(NewDriver {
                name: "A".to_string(),
                driver_number: 3,
            })
            .await
            .unwrap();
        uow.commit().await.unwrap();

        assert_eq!(f.service.get(inserted.id).await.unwrap(), inserted);
        assert_eq!(f.service.get(inserted.id).await.unwrap(), inserted);

        assert_eq!(f.store.finds.load(Ordering::SeqCst), 1);
        assert!(f.backend.exists("driver1").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_caches_with_very_long_ttl() {
        let f = fixture().await;
        let service = DriverService::new(
            f.store.clone(),
            CacheService::new(f.backend.clone()),
            Duration::from_secs(10_000_000_000_000),
        );

        let driver = service.create(request("A")).await.unwrap();

        let cached: Option<Driver> = service.cache().get(&driver.cache_key()).await.unwrap();
        assert_eq!(cached, Some(driver));
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let f = fixture().await;
        assert!(matches!(f.service.get(5).await, Err(AppError::NotFound(_))));
    }

    struct DownBackend;

    #[async_trait]
    impl CacheBackend for DownBackend {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(AppError::CacheUnavailable("down".into()))
        }
        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<bool> {
            Err(AppError::CacheUnavailable("down".into()))
        }
        async fn exists(&self, _key: &str) -> Result<bool> {
            Err(AppError::CacheUnavailable("down".into()))
        }
        async fn delete(&self, _key: &str) -> Result<bool> {
            Err(AppError::CacheUnavailable("down".into()))
        }
        async fn ping(&self) -> Result<()> {
            Err(AppError::CacheUnavailable("down".into()))
        }
        fn name(&self) -> &'static str {
            "down"
        }
    }

    #[tokio::test]
    async fn test_cache_outage_degrades_to_store() {
        let store = Arc::new(
            SqliteDriverStore::connect_with("sqlite::memory:", 1)
                .await
                .unwrap(),
        );
        let service = DriverService::new(
            store,
            CacheService::new(Arc::new(DownBackend)),
            Duration::from_secs(30),
        );

        let created = service.create(request("A")).await.unwrap();
        assert_eq!(service.list().await.unwrap(), vec![created.clone()]);
        assert_eq!(service.get(created.id).await.unwrap(), created);
        service.delete(created.id).await.unwrap();
        assert!(service.list().await.unwrap().is_empty());
    }
}
