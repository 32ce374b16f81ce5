//! Response cache middleware.
//!
//! Runs the [`RequestInterceptor`](lb_cache::RequestInterceptor) protocol
//! around the routes it is layered on: reads are answered from the cache
//! when possible and populate it on a miss; successful mutations invalidate
//! their own path.

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use lb_cache::{CacheEntry, Interception, RequestKind};

use crate::context::AppContext;
use crate::error::AppError;

/// Reports whether a read was served from the cache (`Hit`) or rendered
/// fresh (`Miss`).
pub static X_LOOKBOOK_CACHE: HeaderName = HeaderName::from_static("x-lookbook-cache");

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub async fn cache_middleware(
    State(ctx): State<AppContext>,
    request: Request,
    next: Next,
) -> Response {
    let kind = RequestKind::from_method(request.method().as_str());
    // The cached handlers ignore query strings, so keys use the bare path.
    // Mutations then invalidate every variant a client could have read.
    let path = request.uri().path().to_owned();

    let interception = ctx.interceptor.process_request(kind, &path).await;
    if let Interception::Hit(entry) = &interception {
        return cached_response(entry.clone());
    }

    let response = next.run(request).await;
    if !response.status().is_success() {
        ctx.interceptor
            .process_response(kind, &path, &interception, None)
            .await;
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let body = match to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(e) => {
            return AppError::new(lb_core::Error::Internal(format!(
                "failed to buffer response for {path}: {e}"
            )))
            .into_response()
        }
    };

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_owned();
    let entry = CacheEntry::new(content_type, body);

    ctx.interceptor
        .process_response(kind, &path, &interception, Some(&entry))
        .await;

    if interception == Interception::Miss {
        parts
            .headers
            .insert(X_LOOKBOOK_CACHE.clone(), HeaderValue::from_static("Miss"));
    }
    Response::from_parts(parts, Body::from(entry.body))
}

fn cached_response(entry: CacheEntry) -> Response {
    let content_type = HeaderValue::from_str(&entry.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));

    let mut response = (StatusCode::OK, Body::from(entry.body)).into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, content_type);
    headers.insert(X_LOOKBOOK_CACHE.clone(), HeaderValue::from_static("Hit"));
    response
}
