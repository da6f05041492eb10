use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::llm_client::{GeminiClient, VisionModel};
use crate::rate_limit::RateLimiter;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Concrete client, for Gemini-specific calls (model listing).
    pub llm: GeminiClient,
    /// The analysis seam. Default: the same Gemini client; tests inject a fake.
    pub analyzer: Arc<dyn VisionModel>,
    pub limiter: Arc<RateLimiter>,
    pub config: Config,
}
