//! Unified error type for lookbook.
//!
//! Every crate funnels its failures into [`Error`], which carries enough
//! context for the HTTP layer to derive a status code via
//! [`Error::http_status`].

use std::fmt;

/// Unified error type covering all failure modes in lookbook.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The uploaded bytes are not a recognizable image.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Re-encoding an image to the canonical format failed.
    #[error("Encode error: {0}")]
    Encode(String),

    /// The requested thumbnail size is not one the policy derives.
    #[error("Invalid thumbnail size: {width}x{height}")]
    InvalidSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "image", "blob").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// An indexed image has no bytes in blob storage.
    #[error("Blob missing for indexed image: {id}")]
    BlobMissing {
        /// The id of the indexed record.
        id: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The cache backend failed.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Request or configuration data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Decode(_) => 400,
            Error::Encode(_) => 500,
            Error::InvalidSize { .. } => 400,
            Error::NotFound { .. } => 404,
            Error::BlobMissing { .. } => 404,
            Error::Io { .. } => 500,
            Error::Cache(_) => 500,
            Error::Validation(_) => 400,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Decode(_) => "decode_error",
            Error::Encode(_) => "encode_error",
            Error::InvalidSize { .. } => "invalid_size",
            Error::NotFound { .. } => "not_found",
            Error::BlobMissing { .. } => "not_found",
            Error::Io { .. } => "io_error",
            Error::Cache(_) => "cache_error",
            Error::Validation(_) => "validation_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Decode`].
    pub fn decode(msg: impl fmt::Display) -> Self {
        Error::Decode(msg.to_string())
    }

    /// Convenience constructor for [`Error::Cache`].
    pub fn cache(msg: impl fmt::Display) -> Self {
        Error::Cache(msg.to_string())
    }

    /// True for failures caused by the client's input rather than the server.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_display() {
        let err = Error::decode("unsupported format");
        assert_eq!(err.to_string(), "Decode error: unsupported format");
        assert_eq!(err.http_status(), 400);
        assert!(err.is_client_error());
    }

    #[test]
    fn invalid_size_display() {
        let err = Error::InvalidSize {
            width: 200,
            height: 200,
        };
        assert_eq!(err.to_string(), "Invalid thumbnail size: 200x200");
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.code(), "invalid_size");
    }

    #[test]
    fn not_found_display() {
        let err = Error::not_found("image", "abc-123");
        assert_eq!(err.to_string(), "image not found: abc-123");
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn blob_missing_is_not_found_to_clients() {
        let err = Error::BlobMissing { id: "abc".into() };
        assert_eq!(err.http_status(), 404);
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.http_status(), 500);
        assert!(!err.is_client_error());
    }

    #[test]
    fn cache_display() {
        let err = Error::cache("connection refused");
        assert_eq!(err.to_string(), "Cache error: connection refused");
        assert_eq!(err.http_status(), 500);
    }
}
