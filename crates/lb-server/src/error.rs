//! Error-to-HTTP response conversion.
//!
//! Wraps [`lb_core::Error`] so route handlers can return
//! `Result<T, AppError>` and still use `?` on store and cache calls.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::middleware::request_id::RequestId;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: lb_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: lb_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Error mapper tagging failures with the current request's id.
    pub fn tagged(request_id: &RequestId) -> impl Fn(lb_core::Error) -> AppError + '_ {
        move |e| AppError::new(e).with_request_id(request_id.0.clone())
    }

    pub fn inner(&self) -> &lb_core::Error {
        &self.inner
    }
}

impl From<lb_core::Error> for AppError {
    fn from(e: lb_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        } else {
            tracing::debug!(status = %status, error = %self.inner, "Rejected request");
        }

        let body = json!({
            "error": self.inner.to_string(),
            "code": self.inner.code(),
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}
