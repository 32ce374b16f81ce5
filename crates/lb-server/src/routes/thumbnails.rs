use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Extension;
use lb_core::{Error, ImageId};
use lb_imaging::ThumbnailSpec;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// GET /thumbnails/{id}/{width}x{height}
///
/// Only sizes the thumbnail policy advertises for the image are rendered;
/// anything else is a 400.
pub async fn get_thumbnail(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path((id, size)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let tag = AppError::tagged(&request_id);
    let id: ImageId = id.parse().map_err(&tag)?;
    let spec: ThumbnailSpec = size.parse().map_err(&tag)?;

    let record = ctx
        .store
        .get(&id)
        .ok_or_else(|| tag(Error::not_found("image", id)))?;
    let data = ctx
        .store
        .make_thumbnail(&record, spec.width, spec.height)
        .await
        .map_err(&tag)?;

    Ok(([(CONTENT_TYPE, record.format.mime_type())], data))
}
