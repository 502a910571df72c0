//! Driver Cache - a read-through cache service for drivers
//!
//! Serves driver records from a SQLite store, with a TTL cache (Redis or
//! in-process) in front of it.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use driver_cache::api::{create_router, AppState};
use driver_cache::cache::{CacheBackend, CacheService, InMemoryBackend, RedisBackend};
use driver_cache::store::{DriverStore, SqliteDriverStore};
use driver_cache::{spawn_cleanup_task, Config, DriverService};

/// Main entry point for the driver cache service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the store and create the schema
/// 4. Connect the cache backend (and start its cleanup task if in-memory)
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM, then close cache and store
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "driver_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Driver Cache Service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, cache_ttl={}s, cache={}, invalidate_collection_on_write={}",
        config.server_port,
        config.cache_ttl,
        config.cache_url,
        config.invalidate_collection_on_write
    );

    let store = Arc::new(
        SqliteDriverStore::connect(&config)
            .await
            .context("failed to open driver store")?,
    );

    let (backend, cleanup_handle) = connect_cache(&config).await?;
    info!("Cache backend '{}' ready", backend.name());

    let drivers = DriverService::new(
        store.clone(),
        CacheService::new(backend.clone()),
        config.cache_ttl(),
    )
    .with_collection_invalidation(config.invalidate_collection_on_write);

    let app = create_router(AppState::new(drivers));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await;

    // Release cache and store even if the server stopped on an error
    backend.shutdown().await;
    store.close().await;
    served.context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Builds the configured cache backend.
///
/// The in-memory backend gets a cleanup task whose handle is returned so
/// shutdown can abort it.
async fn connect_cache(
    config: &Config,
) -> anyhow::Result<(Arc<dyn CacheBackend>, Option<JoinHandle<()>>)> {
    if config.uses_memory_cache() {
        let memory = Arc::new(InMemoryBackend::new());
        let handle = spawn_cleanup_task(memory.clone(), config.cleanup_interval);
        let backend: Arc<dyn CacheBackend> = memory;
        return Ok((backend, Some(handle)));
    }

    let redis = RedisBackend::connect(&config.cache_url)
        .await
        .with_context(|| format!("failed to connect cache at {}", config.cache_url))?;
    let backend: Arc<dyn CacheBackend> = Arc::new(redis);
    Ok((backend, None))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Cleanup task aborted");
    }
}
