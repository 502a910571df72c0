//! API Module
//!
//! HTTP handlers and routing for the driver REST API.
//!
//! # Endpoints
//! - `GET /api/drivers/drivers` - List drivers
//! - `GET /api/drivers/driver?id=` - Fetch one driver
//! - `POST /api/drivers/AddDriver` - Create a driver
//! - `DELETE /api/drivers/DeleteDriver?id=` - Delete a driver
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
