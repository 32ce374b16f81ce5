//! In-process backend built on a concurrent map.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use lb_core::Result;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::CacheBackend;

struct StoredValue {
    data: Vec<u8>,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Thread-safe in-memory store.
///
/// Expired values are never returned; a sweeper task started by
/// [`connect`](CacheBackend::connect) drops them periodically.
pub struct MemoryBackend {
    entries: Arc<DashMap<String, StoredValue>>,
    sweep_interval: Duration,
    sweeper: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl MemoryBackend {
    pub fn new(sweep_interval: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            sweep_interval,
            sweeper: Mutex::new(None),
        }
    }

    /// Number of stored values, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired values, returning how many were removed.
    pub fn sweep(&self) -> usize {
        sweep(&self.entries)
    }
}

fn sweep(entries: &DashMap<String, StoredValue>) -> usize {
    let before = entries.len();
    let now = Instant::now();
    entries.retain(|_, value| value.is_live(now));
    before.saturating_sub(entries.len())
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self) -> Result<()> {
        let mut sweeper = self.sweeper.lock();
        if sweeper.is_some() {
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let entries = Arc::clone(&self.entries);
        let interval = self.sweep_interval;
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = sweep(&entries);
                        if removed > 0 {
                            tracing::debug!("Swept {removed} expired cache entries");
                        }
                    }
                    _ = token.cancelled() => break,
                }
            }
        });

        *sweeper = Some((cancel, handle));
        Ok(())
    }

    async fn close(&self) {
        let sweeper = self.sweeper.lock().take();
        if let Some((cancel, handle)) = sweeper {
            cancel.cancel();
            let _ = handle.await;
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .entries
            .get(key)
            .filter(|value| value.is_live(Instant::now()))
            .map(|value| value.data.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            StoredValue {
                data: value,
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
