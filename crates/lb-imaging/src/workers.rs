//! Bounded pool for CPU-bound image work.
//!
//! Jobs run on a dedicated rayon pool and hand their result back to the
//! awaiting request flow through a oneshot channel, so async tasks suspend
//! at `submit(..).await` instead of blocking a runtime thread.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use lb_core::{Error, Result};
use tokio::sync::oneshot;

/// A fixed-size pool of worker threads.
///
/// Cloning is cheap and every clone submits to the same threads.
#[derive(Clone)]
pub struct WorkerPool {
    pool: Arc<rayon::ThreadPool>,
}

impl WorkerPool {
    /// Build a pool with `threads` workers. Zero means one per available core.
    pub fn new(threads: usize) -> Result<Self> {
        let threads = if threads == 0 { num_cpus::get() } else { threads };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("lookbook-worker-{i}"))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build worker pool: {e}")))?;

        tracing::info!("Worker pool started with {threads} threads");
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `job` on the pool and await its result.
    ///
    /// Once submitted, a job always runs to completion even if the returned
    /// future is dropped; only the result is discarded. A panicking job is
    /// reported as [`Error::Internal`].
    pub async fn submit<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        self.pool.spawn(move || {
            let outcome = catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|panic| {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(Error::Internal(format!("worker panicked: {message}")))
            });
            // The receiver is gone if the caller gave up; nothing to do.
            let _ = tx.send(outcome);
        });

        rx.await
            .map_err(|_| Error::Internal("worker dropped its result channel".into()))?
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.size())
            .finish()
    }
}
