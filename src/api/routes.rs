//! API Routes
//!
//! Configures the Axum router with all driver service endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_driver_handler, delete_driver_handler, get_driver_handler, health_handler,
    list_drivers_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/drivers/drivers` - List all drivers
/// - `GET /api/drivers/driver?id=` - Fetch one driver
/// - `POST /api/drivers/AddDriver` - Create a driver
/// - `DELETE /api/drivers/DeleteDriver?id=` - Delete a driver
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let drivers = Router::new()
        .route("/drivers", get(list_drivers_handler))
        .route("/driver", get(get_driver_handler))
        .route("/AddDriver", post(create_driver_handler))
        .route("/DeleteDriver", delete(delete_driver_handler));

    Router::new()
        .nest("/api/drivers", drivers)
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
