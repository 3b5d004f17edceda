use std::sync::Arc;

use crate::config::Config;
use crate::generation::client::CvGenerator;
use crate::ratelimit::RateLimiter;
use crate::stats::StatsCache;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum
/// extractors. The stats cache and rate limiter live here rather than as
/// module globals, so their lifecycle is explicit and tests construct their
/// own.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// External text-generation service behind a trait seam.
    pub generator: Arc<dyn CvGenerator>,
    pub config: Config,
    pub stats: Arc<StatsCache>,
    pub rate_limiter: Arc<RateLimiter>,
}
