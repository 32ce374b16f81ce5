//! Byte stores that back the response cache.
//!
//! A backend only needs atomic single-key get, set-with-TTL, and delete;
//! no cross-key transactions are assumed.

mod memory;
#[cfg(feature = "redis")]
mod redis;

use std::time::Duration;

use async_trait::async_trait;
use lb_core::Result;

pub use memory::MemoryBackend;
#[cfg(feature = "redis")]
pub use self::redis::RedisBackend;

/// Key/value byte store with per-entry expiry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Human-readable backend name for logs.
    fn name(&self) -> &'static str;

    /// Establish connections or start housekeeping. Called once at startup.
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    /// Release connections and stop housekeeping. Called once at shutdown.
    async fn close(&self) {}

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value`, replacing any previous value, expiring after `ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Remove `key`; removing a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;
}
