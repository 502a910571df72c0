//! SQLite driver store implementation.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Driver, NewDriver};
use crate::store::{DriverStore, DriverUnitOfWork};

const CREATE_DRIVERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS drivers (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT    NOT NULL,
    driver_number INTEGER NOT NULL DEFAULT 0
)
"#;

/// Driver store backed by a SQLite connection pool.
#[derive(Clone)]
pub struct SqliteDriverStore {
    pool: SqlitePool,
}

impl SqliteDriverStore {
    /// Connects using the database settings in `config` and creates the schema.
    pub async fn connect(config: &Config) -> Result<Self> {
        let max_connections = if config.uses_memory_database() {
            1
        } else {
            config.database_max_connections.max(1)
        };
        Self::connect_with(&config.database_url, max_connections).await
    }

    /// Connects to `url` with at most `max_connections` pooled connections.
    pub async fn connect_with(url: &str, max_connections: u32) -> Result<Self> {
        info!("Connecting to SQLite database...");

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            // An in-memory database vanishes with its last connection
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(url)
            .await
            .map_err(|e| {
                warn!("Failed to connect to database: {}", e);
                AppError::Store(format!("Failed to connect: {}", e))
            })?;

        let store = Self { pool };
        store.migrate().await?;

        info!("SQLite connection pool established");
        Ok(store)
    }

    /// Creates the drivers table if it does not exist.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_DRIVERS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Store(format!("Migration failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl DriverStore for SqliteDriverStore {
    async fn list(&self) -> Result<Vec<Driver>> {
        debug!("Listing drivers");

        let drivers = sqlx::query_as::<_, Driver>(
            "SELECT id, name, driver_number FROM drivers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(drivers)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Driver>> {
        debug!("Finding driver by id: {}", id);

        let driver = sqlx::query_as::<_, Driver>(
            "SELECT id, name, driver_number FROM drivers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(driver)
    }

    async fn begin(&self) -> Result<Box<dyn DriverUnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteUnitOfWork { tx }))
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Store(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    async fn close(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }
}

/// A SQLite transaction.
struct SqliteUnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl DriverUnitOfWork for SqliteUnitOfWork {
    async fn insert(&mut self, driver: NewDriver) -> Result<Driver> {
        let inserted = sqlx::query_as::<_, Driver>(
            r#"
            INSERT INTO drivers (name, driver_number)
            VALUES (?, ?)
            RETURNING id, name, driver_number
            "#,
        )
        .bind(&driver.name)
        .bind(driver.driver_number)
        .fetch_one(&mut *self.tx)
        .await?;

        debug!("Inserted driver {}", inserted.id);
        Ok(inserted)
    }

    async fn delete(&mut self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM drivers WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteDriverStore {
        SqliteDriverStore::connect_with("sqlite::memory:", 1)
            .await
            .unwrap()
    }

    fn new_driver(name: &str) -> NewDriver {
        NewDriver {
            name: name.to_string(),
            driver_number: 1,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_id_before_commit() {
        let store = memory_store().await;

        let mut uow = store.begin().await.unwrap();
        let first = uow.insert(new_driver("A")).await.unwrap();
        let second = uow.insert(new_driver("B")).await.unwrap();
        uow.commit().await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.list().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_rolls_back() {
        let store = memory_store().await;

        {
            let mut uow = store.begin().await.unwrap();
            uow.insert(new_driver("A")).await.unwrap();
        }

        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let store = memory_store().await;

        let mut uow = store.begin().await.unwrap();
        let inserted = uow.insert(new_driver("A")).await.unwrap();
        uow.commit().await.unwrap();

        assert_eq!(store.find_by_id(inserted.id).await.unwrap(), Some(inserted));
        assert_eq!(store.find_by_id(999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = memory_store().await;

        let mut uow = store.begin().await.unwrap();
        let inserted = uow.insert(new_driver("A")).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        assert!(uow.delete(inserted.id).await.unwrap());
        assert!(!uow.delete(inserted.id).await.unwrap());
        uow.commit().await.unwrap();

        assert!(store.find_by_id(inserted.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_health_check() {
        let store = memory_store().await;
        assert!(store.health_check().await.is_ok());

        store.close().await;
        assert!(matches!(
            store.health_check().await,
            Err(AppError::Store(_))
        ));
    }
}
