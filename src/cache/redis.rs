//! Redis Backend Module
//!
//! Network cache backend using Redis `SET ... PX`, `GET`, `EXISTS` and `DEL`.
//! The connection is opened once at startup and shared by all requests;
//! `reconnect` and `shutdown` are the explicit lifecycle hooks.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Client;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::cache::entry::ttl_millis;
use crate::cache::CacheBackend;
use crate::error::{AppError, Result};

/// Upper bound on a single Redis round trip.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

// == Redis Backend ==
/// Cache backend talking to a single Redis server.
pub struct RedisBackend {
    client: Client,
    /// `None` once shut down
    conn: RwLock<Option<ConnectionManager>>,
}

impl RedisBackend {
    // == Connect ==
    /// Opens the connection to `url` and verifies it with `PING`.
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to Redis at {}", url);

        let client = Client::open(url)?;
        let manager = open_manager(&client).await?;
        let backend = Self {
            client,
            conn: RwLock::new(Some(manager)),
        };
        backend.ping().await?;

        info!("Redis connection established");
        Ok(backend)
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        self.conn
            .read()
            .await
            .clone()
            .ok_or_else(|| AppError::CacheUnavailable("redis connection is closed".to_string()))
    }

    /// Runs one command against the shared connection with a timeout.
    async fn run<T, F, Fut>(&self, command: &str, f: F) -> Result<T>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let conn = self.connection().await?;
        match timeout(COMMAND_TIMEOUT, f(conn)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!("Redis {} failed: {}", command, e);
                Err(e.into())
            }
            Err(_) => {
                warn!("Redis {} timed out after {:?}", command, COMMAND_TIMEOUT);
                Err(AppError::CacheUnavailable(format!(
                    "redis {} timed out",
                    command
                )))
            }
        }
    }
}

async fn open_manager(client: &Client) -> Result<ConnectionManager> {
    match timeout(COMMAND_TIMEOUT, ConnectionManager::new(client.clone())).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(AppError::CacheUnavailable(
            "timed out connecting to redis".to_string(),
        )),
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.run("GET", |mut conn| async move {
            redis::cmd("GET")
                .arg(key)
                .query_async::<Option<String>>(&mut conn)
                .await
        })
        .await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<bool> {
        let ms = ttl_millis(ttl);
        if ms == 0 {
            // PX rejects zero; an already-expired write just evicts
            self.delete(key).await?;
            return Ok(false);
        }

        let reply = self
            .run("SET", |mut conn| async move {
                redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("PX")
                    .arg(ms)
                    .query_async::<Option<String>>(&mut conn)
                    .await
            })
            .await?;

        Ok(reply.as_deref() == Some("OK"))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.run("EXISTS", |mut conn| async move {
            redis::cmd("EXISTS")
                .arg(key)
                .query_async::<bool>(&mut conn)
                .await
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let removed = self
            .run("DEL", |mut conn| async move {
                redis::cmd("DEL").arg(key).query_async::<i64>(&mut conn).await
            })
            .await?;
        Ok(removed > 0)
    }

    async fn ping(&self) -> Result<()> {
        let pong = self
            .run("PING", |mut conn| async move {
                redis::cmd("PING").query_async::<String>(&mut conn).await
            })
            .await?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(AppError::CacheUnavailable(format!(
                "unexpected PING reply: {}",
                pong
            )))
        }
    }

    /// Replaces the shared connection with a fresh one.
    async fn reconnect(&self) -> Result<()> {
        let manager = open_manager(&self.client).await?;
        *self.conn.write().await = Some(manager);
        info!("Redis connection re-established");
        Ok(())
    }

    async fn shutdown(&self) {
        if self.conn.write().await.take().is_some() {
            info!("Redis connection closed");
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
