//! Driver Cache - a read-through cache service for drivers
//!
//! Serves driver records from a SQLite store, with a TTL cache (Redis or
//! in-process) in front of it.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use service::DriverService;
pub use tasks::spawn_cleanup_task;
