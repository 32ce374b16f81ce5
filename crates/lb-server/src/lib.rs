//! lb-server: the HTTP surface of lookbook.
//!
//! Composes the image store and the response cache behind an axum router:
//!
//! - Upload, list, original, and delete endpoints for images
//! - Policy-validated thumbnail rendering
//! - Cache middleware driving the request interceptor protocol
//! - Eager cache startup and graceful shutdown via signal handling

pub mod context;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use lb_cache::ResponseCache;
use lb_core::config::Config;
use lb_core::{SystemClock, UuidGenerator};
use lb_imaging::{FsBlobStorage, ImageStore, RasterCodec, StoreSettings, WorkerPool};
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;

/// Build the production [`AppContext`]: filesystem blobs under
/// `storage.path`, the raster codec, a worker pool sized from config, the
/// configured cache backend, wall-clock timestamps, and random ids.
pub fn build_context(config: Config) -> lb_core::Result<AppContext> {
    let blobs = Arc::new(FsBlobStorage::new(&config.storage.path)?);
    tracing::info!("Storing images under {}", config.storage.path.display());

    let workers = WorkerPool::new(config.workers.threads)?;
    let store = ImageStore::new(
        StoreSettings::from(&config),
        Arc::new(RasterCodec::new()),
        blobs,
        workers,
        Arc::new(SystemClock),
    );
    let cache = Arc::new(ResponseCache::from_config(&config.cache)?);

    Ok(AppContext::new(config, store, cache, Arc::new(UuidGenerator)))
}

/// Start the lookbook server.
///
/// Brings the cache up before binding, serves until SIGINT/SIGTERM or until
/// `cancel` fires, drains in-flight requests, then shuts the cache down.
pub async fn start(config: Config, cancel: CancellationToken) -> lb_core::Result<()> {
    for warning in config.validate()? {
        tracing::warn!("Config warning: {warning}");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| lb_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = build_context(config)?;
    ctx.lifecycle.startup().await?;

    let app = router::build_router(ctx.clone());

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            ctx.lifecycle.shutdown().await;
            return Err(lb_core::Error::Internal(format!(
                "Failed to bind to {addr}: {e}"
            )));
        }
    };
    tracing::info!("Starting server on {addr}");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await;

    ctx.lifecycle.shutdown().await;
    served?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C, SIGTERM, or cancellation.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = cancel.cancelled() => {}
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_context_creates_storage_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.path = dir.path().join("blobs");
        config.workers.threads = 1;

        let ctx = build_context(config).unwrap();
        assert!(dir.path().join("blobs").is_dir());
        assert!(ctx.store.is_empty());
        assert_eq!(ctx.cache.backend_name(), "memory");
    }

    #[tokio::test]
    async fn start_rejects_invalid_config() {
        let mut config = Config::default();
        config.server.port = 0;
        let err = start(config, CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, lb_core::Error::Validation(_)));
    }
}
