//! Application context shared by every handler via axum state.

use std::sync::Arc;

use lb_cache::{Lifecycle, RequestInterceptor, ResponseCache};
use lb_core::config::Config;
use lb_core::IdGenerator;
use lb_imaging::ImageStore;

/// Components the orchestrator composes, each constructed once per process.
///
/// The response cache appears three times: as itself, for targeted
/// invalidation from handlers, and through the two roles the server drives
/// explicitly.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub store: ImageStore,
    pub cache: Arc<ResponseCache>,
    pub interceptor: Arc<dyn RequestInterceptor>,
    pub lifecycle: Arc<dyn Lifecycle>,
    pub ids: Arc<dyn IdGenerator>,
}

impl AppContext {
    pub fn new(
        config: Config,
        store: ImageStore,
        cache: Arc<ResponseCache>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            interceptor: cache.clone(),
            lifecycle: cache.clone(),
            cache,
            ids,
        }
    }
}
