//! Image collection, upload, original, and delete handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_TYPE, LAST_MODIFIED, LOCATION};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use lb_core::{paths, Error, ImageFormat, ImageId};
use lb_imaging::ImageRecord;
use serde::Serialize;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// Wire shape of one image.
#[derive(Debug, Serialize)]
pub struct ImageDocument {
    pub id: ImageId,
    pub uri: String,
    /// HTTP-date of ingest.
    pub modified: String,
    pub size: [u32; 2],
    /// Thumbnail links, largest first.
    pub thumbnails: Vec<String>,
}

impl ImageDocument {
    pub fn new(ctx: &AppContext, record: &ImageRecord) -> Self {
        let thumbnails = ctx
            .store
            .thumbnails(record)
            .into_iter()
            .map(|spec| paths::thumbnail_uri(&record.id, spec.width, spec.height))
            .collect();

        Self {
            id: record.id,
            uri: record.uri(),
            modified: paths::http_date(&record.modified),
            size: [record.width, record.height],
            thumbnails,
        }
    }
}

/// Parse the `{id}` or `{id}.{ext}` path segment.
fn parse_file(file: &str) -> Result<(ImageId, Option<&str>), Error> {
    let (stem, ext) = paths::split_file_name(file);
    Ok((stem.parse()?, ext))
}

/// GET /images
pub async fn list_images(State(ctx): State<AppContext>) -> Json<Vec<ImageDocument>> {
    let documents = ctx
        .store
        .list()
        .iter()
        .map(|record| ImageDocument::new(&ctx, record))
        .collect();
    Json(documents)
}

/// POST /images
///
/// The raw request body is the image. Responds 201 with the new document
/// and a `Location` pointing at the canonical original.
pub async fn upload_image(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    if body.is_empty() {
        return Err(AppError::tagged(&request_id)(Error::decode("empty upload")));
    }

    let id = ctx.ids.next_id();
    let record = ctx
        .store
        .save(id, body)
        .await
        .map_err(AppError::tagged(&request_id))?;

    let document = ImageDocument::new(&ctx, &record);
    Ok((
        StatusCode::CREATED,
        [(LOCATION, document.uri.clone())],
        Json(document),
    ))
}

/// GET /images/{id}.{ext}
pub async fn get_original(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let tag = AppError::tagged(&request_id);
    let (id, ext) = parse_file(&file).map_err(&tag)?;
    let (record, data) = ctx.store.read_original(&id).await.map_err(&tag)?;

    if let Some(ext) = ext {
        if ext.parse::<ImageFormat>().ok() != Some(record.format) {
            return Err(tag(Error::not_found("image", &file)));
        }
    }

    Ok((
        [
            (CONTENT_TYPE, record.format.mime_type().to_string()),
            (LAST_MODIFIED, paths::http_date(&record.modified)),
        ],
        data,
    ))
}

/// DELETE /images/{id}
///
/// The collection and every advertised thumbnail of the image are
/// invalidated once the image is gone.
pub async fn delete_image(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path(file): Path<String>,
) -> Result<StatusCode, AppError> {
    let tag = AppError::tagged(&request_id);
    let (id, _) = parse_file(&file).map_err(&tag)?;
    let record = ctx.store.delete(&id).await.map_err(&tag)?;

    let mut stale = vec![paths::IMAGES_URI.to_string()];
    stale.extend(
        ctx.store
            .thumbnails(&record)
            .into_iter()
            .map(|spec| paths::thumbnail_uri(&id, spec.width, spec.height)),
    );
    for path in stale {
        if let Err(e) = ctx.cache.invalidate(&ctx.cache.key_for(&path)).await {
            tracing::warn!("Deleted image {id} but {path} may be served stale: {e}");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}
