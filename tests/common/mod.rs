//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which wires a full [`AppContext`] to in-memory
//! blob storage, an in-memory cache backend, a manual clock, and scripted
//! ids, then drives the router in-process with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use lb_cache::{MemoryBackend, ResponseCache};
use lb_core::config::Config;
use lb_core::{FixedIds, ImageId, ManualClock};
use lb_imaging::{ImageStore, MemoryBlobStorage, RasterCodec, StoreSettings, WorkerPool};
use lb_server::context::AppContext;
use lb_server::router::build_router;

/// Collected response from a routed request.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Value of the `x-lookbook-cache` header, if any.
    pub fn cache_status(&self) -> Option<&str> {
        self.header("x-lookbook-cache")
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`] with in-memory
/// collaborators.
pub struct TestHarness {
    pub ctx: AppContext,
    pub blobs: Arc<MemoryBlobStorage>,
    pub backend: Arc<MemoryBackend>,
    pub clock: Arc<ManualClock>,
    router: Router,
}

impl TestHarness {
    /// Harness with a thumbnail floor of 100 and random ids.
    pub fn new() -> Self {
        Self::with_ids(Vec::new())
    }

    /// Harness handing out `ids` to uploads in order.
    pub fn with_ids(ids: Vec<ImageId>) -> Self {
        let mut config = Config::default();
        config.images.min_thumb_size = 100;
        config.workers.threads = 2;
        Self::with_config(config, ids)
    }

    pub fn with_config(config: Config, ids: Vec<ImageId>) -> Self {
        let blobs = Arc::new(MemoryBlobStorage::new());
        let backend = Arc::new(MemoryBackend::default());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ));

        let store = ImageStore::new(
            StoreSettings::from(&config),
            Arc::new(RasterCodec::new()),
            blobs.clone(),
            WorkerPool::new(config.workers.threads).expect("failed to build worker pool"),
            clock.clone(),
        );
        let cache = Arc::new(ResponseCache::new(
            backend.clone(),
            config.cache.prefix.clone(),
            Duration::from_secs(config.cache.ttl_secs),
        ));

        let ctx = AppContext::new(config, store, cache, Arc::new(FixedIds::new(ids)));
        let router = build_router(ctx.clone());

        Self {
            ctx,
            blobs,
            backend,
            clock,
            router,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Vec<u8>) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body))
            .expect("failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("failed to read body")
            .to_bytes();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, Vec::new()).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Vec::new()).await
    }

    /// Upload raw bytes to `POST /images`.
    pub async fn upload(&self, data: Vec<u8>) -> TestResponse {
        self.request(Method::POST, "/images", data).await
    }

    /// Upload a generated PNG and return the created document.
    pub async fn upload_png(&self, width: u32, height: u32) -> serde_json::Value {
        let response = self.upload(png_bytes(width, height)).await;
        assert_eq!(response.status, StatusCode::CREATED, "upload failed");
        response.json()
    }

    /// Whether the cache currently holds an entry for `path`.
    pub async fn cached(&self, path: &str) -> bool {
        let key = self.ctx.cache.key_for(path);
        self.ctx.cache.lookup(&key).await.is_some()
    }
}

/// A solid-color RGBA PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([30, 120, 200, 255]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("failed to encode test png");
    buf.into_inner()
}

/// Well-known ids for deterministic URIs.
pub fn fixed_id(n: u8) -> ImageId {
    format!("00000000-0000-4000-8000-0000000000{n:02x}")
        .parse()
        .expect("valid uuid")
}
