//! API Handlers
//!
//! HTTP request handlers for each driver endpoint. Handlers only translate
//! between HTTP and `DriverService`; the cache policy lives there.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use tracing::warn;

use crate::cache::CacheBackend;
use crate::error::Result;
use crate::models::{
    CreateDriverRequest, DependencyStatus, Driver, DriverIdQuery, HealthResponse, StatsResponse,
    DRIVERS_CACHE_KEY,
};
use crate::service::DriverService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Driver operations with caching applied
    pub drivers: DriverService,
}

impl AppState {
    /// Creates a new AppState around the driver service.
    pub fn new(drivers: DriverService) -> Self {
        Self { drivers }
    }
}

/// Handler for GET /api/drivers/drivers
pub async fn list_drivers_handler(State(state): State<AppState>) -> Result<Json<Vec<Driver>>> {
    let drivers = state.drivers.list().await?;
    Ok(Json(drivers))
}

/// Handler for GET /api/drivers/driver?id=
pub async fn get_driver_handler(
    State(state): State<AppState>,
    Query(query): Query<DriverIdQuery>,
) -> Result<Json<Driver>> {
    let driver = state.drivers.get(query.id).await?;
    Ok(Json(driver))
}

/// Handler for POST /api/drivers/AddDriver
///
/// Responds 200 with the inserted driver, including its generated id.
pub async fn create_driver_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateDriverRequest>,
) -> Result<Json<Driver>> {
    let driver = state.drivers.create(req).await?;
    Ok(Json(driver))
}

/// Handler for DELETE /api/drivers/DeleteDriver?id=
///
/// Responds 204 on success, 404 with a plain-text body for an unknown id.
pub async fn delete_driver_handler(
    State(state): State<AppState>,
    Query(query): Query<DriverIdQuery>,
) -> Result<StatusCode> {
    state.drivers.delete(query.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.drivers.cache();
    // An unreachable backend holds no usable snapshot
    let collection_cached = cache.contains(DRIVERS_CACHE_KEY).await.unwrap_or(false);
    Json(StatsResponse::new(
        cache.backend().name(),
        &cache.stats(),
        collection_cached,
    ))
}

/// Handler for GET /health
///
/// Always 200; a failing dependency shows up as `degraded`. A cache that
/// fails its ping gets one reconnect attempt before being reported.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = state.drivers.cache().backend();
    let (store_check, cache_check) =
        tokio::join!(state.drivers.store().health_check(), check_cache(cache.as_ref()));

    Json(HealthResponse::new(
        DependencyStatus::from_check("sqlite", store_check),
        DependencyStatus::from_check(cache.name(), cache_check),
    ))
}

async fn check_cache(cache: &dyn CacheBackend) -> Result<()> {
    let Err(e) = cache.ping().await else {
        return Ok(());
    };

    warn!(backend = cache.name(), error = %e, "cache ping failed, reconnecting");
    cache.reconnect().await?;
    cache.ping().await
}
