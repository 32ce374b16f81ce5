//! HTTP middleware: request ID and response caching.

pub mod cache;
pub mod request_id;
