//! The two roles a response cache plays for the server.

use async_trait::async_trait;
use lb_core::Result;

use crate::envelope::CacheEntry;

/// Whether a request reads or mutates the resource at its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Read,
    Mutation,
}

impl RequestKind {
    /// `POST`, `PUT`, `PATCH` and `DELETE` mutate; every other method reads.
    pub fn from_method(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "POST" | "PUT" | "PATCH" | "DELETE" => Self::Mutation,
            _ => Self::Read,
        }
    }
}

/// What to do with a request before running its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// Serve this entry and skip the handler.
    Hit(CacheEntry),
    /// Run the handler and hand the result back for population.
    Miss,
    /// A mutation: run the handler, never look up or populate.
    Bypass,
}

/// Per-request cache protocol.
///
/// Reads call [`process_request`](Self::process_request) first and, on a
/// miss, [`process_response`](Self::process_response) exactly once with the
/// fresh result. Mutations invalidate their path only after succeeding.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn process_request(&self, kind: RequestKind, path: &str) -> Interception;

    /// `response` is `None` when the request failed; nothing is cached or
    /// invalidated in that case.
    async fn process_response(
        &self,
        kind: RequestKind,
        path: &str,
        interception: &Interception,
        response: Option<&CacheEntry>,
    );
}

/// Startup and shutdown hooks for components owning external resources.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Acquire resources eagerly, before any request is served.
    async fn startup(&self) -> Result<()>;

    /// Release resources once the server has drained.
    async fn shutdown(&self);
}
