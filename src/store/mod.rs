//! Store Module
//!
//! Relational persistence for drivers. Reads go straight to the store;
//! writes happen inside a unit of work that becomes visible on commit.

mod sqlite;

pub use sqlite::SqliteDriverStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Driver, NewDriver};

/// Driver table access.
#[async_trait]
pub trait DriverStore: Send + Sync {
    /// Returns every driver ordered by id.
    async fn list(&self) -> Result<Vec<Driver>>;

    /// Looks up a single driver.
    async fn find_by_id(&self, id: i64) -> Result<Option<Driver>>;

    /// Starts a unit of work. Dropping it without `commit` rolls it back.
    async fn begin(&self) -> Result<Box<dyn DriverUnitOfWork>>;

    /// Verifies the store answers queries.
    async fn health_check(&self) -> Result<()>;

    /// Closes all connections. Called once during shutdown.
    async fn close(&self);
}

/// Pending writes against the driver table.
#[async_trait]
pub trait DriverUnitOfWork: Send {
    /// Inserts a driver. The returned driver carries its generated id.
    async fn insert(&mut self, driver: NewDriver) -> Result<Driver>;

    /// Deletes a driver. Returns true if a row was deleted.
    async fn delete(&mut self, id: i64) -> Result<bool>;

    /// Makes the pending writes durable.
    async fn commit(self: Box<Self>) -> Result<()>;
}
