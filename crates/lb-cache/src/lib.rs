//! lb-cache: response cache keyed by request path.
//!
//! [`ResponseCache`] maps a request identity to a previously serialized
//! `(content-type, body)` envelope. A failed lookup reads as a miss and a
//! failed populate is only logged. Failed invalidations are logged as errors
//! and returned to the caller.
//!
//! The cache plays two roles, each behind its own trait:
//!
//! - [`RequestInterceptor`]: the hit/miss/invalidate protocol around a request
//! - [`Lifecycle`]: eager startup and graceful shutdown of the backend

pub mod backend;
pub mod cache;
pub mod envelope;
pub mod interceptor;
pub mod key;

pub use backend::{CacheBackend, MemoryBackend};
pub use cache::ResponseCache;
pub use envelope::CacheEntry;
pub use interceptor::{Interception, Lifecycle, RequestInterceptor, RequestKind};
pub use key::CacheKey;

#[cfg(feature = "redis")]
pub use backend::RedisBackend;
