mod analysis;
mod backup;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod rate_limit;
mod records;
mod routes;
mod settings;
mod state;
mod stats;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::GeminiClient;
use crate::rate_limit::RateLimiter;
use crate::routes::build_router;
use crate::state::AppState;

/// Interval for the quota-table sweep. Housekeeping only.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("api={}", &config.rust_log))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting KcalCal API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;

    let llm = GeminiClient::new(config.gemini_api_key.clone());
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; analysis requests will fail until it is configured");
    }
    info!("Gemini client initialized (model: {})", config.gemini_model);

    let limiter = Arc::new(RateLimiter::new());
    spawn_quota_sweeper(Arc::clone(&limiter));

    let state = AppState {
        db,
        llm: llm.clone(),
        analyzer: Arc::new(llm),
        limiter,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Hourly removal of expired quota entries to bound the table's memory.
fn spawn_quota_sweeper(limiter: Arc<RateLimiter>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        ticker.tick().await; // first tick completes immediately
        loop {
            ticker.tick().await;
            let removed = limiter.sweep_expired();
            if removed > 0 {
                debug!("quota sweep removed {removed} expired entries");
            }
        }
    });
}
