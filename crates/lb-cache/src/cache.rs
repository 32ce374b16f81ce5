//! The response cache component.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use lb_core::config::{CacheBackendKind, CacheConfig};
use lb_core::{Error, Result};

use crate::backend::{CacheBackend, MemoryBackend};
use crate::envelope::CacheEntry;
use crate::interceptor::{Interception, Lifecycle, RequestInterceptor, RequestKind};
use crate::key::CacheKey;

/// Maps request paths to serialized responses.
///
/// Concurrent misses on the same key may both do the expensive work and both
/// populate; the last write wins. Entries are always replaced whole.
pub struct ResponseCache {
    backend: Arc<dyn CacheBackend>,
    prefix: String,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(backend: Arc<dyn CacheBackend>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
            ttl,
        }
    }

    /// Build a cache with the backend selected in `config`.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let backend: Arc<dyn CacheBackend> = match config.backend {
            CacheBackendKind::Memory => Arc::new(MemoryBackend::new(config.sweep_interval())),
            #[cfg(feature = "redis")]
            CacheBackendKind::Redis => Arc::new(crate::backend::RedisBackend::new(
                config.redis_url.clone(),
            )),
            #[cfg(not(feature = "redis"))]
            CacheBackendKind::Redis => {
                return Err(Error::Validation(
                    "cache.backend = \"redis\" requires building with the `redis` feature".into(),
                ))
            }
        };
        Ok(Self::new(backend, config.prefix.clone(), config.ttl()))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Default time-to-live for populated entries.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Key for a request path under this cache's namespace.
    pub fn key_for(&self, path: &str) -> CacheKey {
        CacheKey::for_path(&self.prefix, path)
    }

    /// Read an entry. Backend failures and corrupt envelopes read as a miss.
    pub async fn lookup(&self, key: &CacheKey) -> Option<CacheEntry> {
        let data = match self.backend.get(key.as_str()).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!("Cache MISS: {key}");
                return None;
            }
            Err(e) => {
                tracing::warn!("Cache lookup failed for {key}, treating as miss: {e}");
                return None;
            }
        };

        match CacheEntry::decode(&data) {
            Ok(entry) => {
                tracing::debug!("Cache HIT: {key}");
                Some(entry)
            }
            Err(e) => {
                tracing::warn!("Discarding unreadable cache entry {key}: {e}");
                None
            }
        }
    }

    /// Store an entry, replacing any previous one. Best effort: failures are
    /// logged and swallowed.
    pub async fn populate(
        &self,
        key: &CacheKey,
        content_type: &str,
        body: Bytes,
        ttl: Duration,
    ) {
        let entry = CacheEntry::new(content_type, body);
        let result = match entry.encode() {
            Ok(data) => self.backend.set(key.as_str(), data, ttl).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => tracing::debug!("Cache SET: {key} (TTL: {ttl:?})"),
            Err(e) => tracing::warn!("Cache populate failed for {key}: {e}"),
        }
    }

    /// Remove an entry; absent keys are fine. Failures are logged at error
    /// level and returned.
    pub async fn invalidate(&self, key: &CacheKey) -> Result<()> {
        match self.backend.delete(key.as_str()).await {
            Ok(()) => {
                tracing::debug!("Cache DELETE: {key}");
                Ok(())
            }
            Err(e) => {
                tracing::error!("Cache invalidation failed for {key}; stale data may be served: {e}");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("backend", &self.backend.name())
            .field("prefix", &self.prefix)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[async_trait]
impl RequestInterceptor for ResponseCache {
    async fn process_request(&self, kind: RequestKind, path: &str) -> Interception {
        match kind {
            RequestKind::Mutation => Interception::Bypass,
            RequestKind::Read => match self.lookup(&self.key_for(path)).await {
                Some(entry) => Interception::Hit(entry),
                None => Interception::Miss,
            },
        }
    }

    async fn process_response(
        &self,
        kind: RequestKind,
        path: &str,
        interception: &Interception,
        response: Option<&CacheEntry>,
    ) {
        let Some(response) = response else {
            return;
        };
        let key = self.key_for(path);

        match (kind, interception) {
            (RequestKind::Mutation, _) => {
                if let Err(e) = self.invalidate(&key).await {
                    tracing::warn!("Mutation of {path} succeeded but its cache entry remains: {e}");
                }
            }
            (RequestKind::Read, Interception::Miss) if !response.body.is_empty() => {
                self.populate(&key, &response.content_type, response.body.clone(), self.ttl)
                    .await;
            }
            _ => {}
        }
    }
}

#[async_trait]
impl Lifecycle for ResponseCache {
    async fn startup(&self) -> Result<()> {
        self.backend.connect().await?;
        tracing::info!(
            "Response cache ready ({} backend, prefix {:?}, TTL {:?})",
            self.backend.name(),
            self.prefix,
            self.ttl
        );
        Ok(())
    }

    async fn shutdown(&self) {
        self.backend.close().await;
        tracing::info!("Response cache closed");
    }
}
