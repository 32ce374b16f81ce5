//! Redis backend, one logical store shared by every server process.

use std::time::Duration;

use async_trait::async_trait;
use lb_core::{Error, Result};
use parking_lot::RwLock;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::CacheBackend;

/// Backend speaking to a single Redis instance.
///
/// The connection is opened in [`connect`](CacheBackend::connect), at
/// startup, rather than lazily on the first request.
pub struct RedisBackend {
    url: String,
    conn: RwLock<Option<ConnectionManager>>,
}

impl RedisBackend {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            conn: RwLock::new(None),
        }
    }

    fn connection(&self) -> Result<ConnectionManager> {
        self.conn
            .read()
            .clone()
            .ok_or_else(|| Error::cache("redis backend used before connect"))
    }
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("url", &self.url)
            .field("connected", &self.conn.read().is_some())
            .finish()
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn connect(&self) -> Result<()> {
        tracing::info!("Connecting to Redis cache at {}", self.url);

        let client = redis::Client::open(self.url.as_str())
            .map_err(|e| Error::cache(format!("failed to create Redis client: {e}")))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::cache(format!("failed to connect to Redis: {e}")))?;

        *self.conn.write() = Some(manager);
        tracing::info!("Connected to Redis cache");
        Ok(())
    }

    async fn close(&self) {
        self.conn.write().take();
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection()?;
        conn.get(key)
            .await
            .map_err(|e| Error::cache(format!("Redis GET failed: {e}")))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut conn = self.connection()?;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
            .map_err(|e| Error::cache(format!("Redis SETEX failed: {e}")))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection()?;
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| Error::cache(format!("Redis DEL failed: {e}")))
    }
}
