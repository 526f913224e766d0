use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::rate_limit::RateLimiter;
use crate::resume::pipeline::ResumeNormalizer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Resume pipeline; owns the model provider and PDF extractor.
    pub resume: ResumeNormalizer,
    /// In-process by default, Redis-backed when `REDIS_URL` is set.
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub config: Config,
}
