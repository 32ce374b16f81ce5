//! Axum router construction.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::cache::cache_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Routes behind the response cache: the collection (read + upload) and
    // thumbnails. Originals are served straight from blob storage.
    let cached_routes = Router::new()
        .route(
            "/images",
            get(routes::images::list_images).post(routes::images::upload_image),
        )
        .route(
            "/thumbnails/{id}/{size}",
            get(routes::thumbnails::get_thumbnail),
        )
        .route_layer(middleware::from_fn_with_state(ctx.clone(), cache_middleware));

    let max_upload = ctx.config.server.max_upload_bytes;

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/images/{file}",
            get(routes::images::get_original).delete(routes::images::delete_image),
        )
        .merge(cached_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
