//! Domain and transfer models for the driver API
//!
//! The `Driver` entity plus the DTOs used for serializing/deserializing
//! HTTP request and response bodies.

pub mod driver;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use driver::{driver_cache_key, Driver, NewDriver, DRIVERS_CACHE_KEY};
pub use requests::{CreateDriverRequest, DriverIdQuery};
pub use responses::{DependencyStatus, HealthResponse, StatsResponse};
