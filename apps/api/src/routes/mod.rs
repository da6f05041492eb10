pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::backup::handlers as backup;
use crate::records::handlers as records;
use crate::settings::handlers as settings;
use crate::state::AppState;
use crate::stats::handlers as stats;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis gateway
        .route("/api/v1/analyze", post(analysis::handle_analyze))
        .route("/api/v1/analyze/search", post(analysis::handle_search))
        .route("/api/v1/models", get(analysis::handle_list_models))
        // Food records
        .route(
            "/api/v1/records",
            get(records::handle_list_records).post(records::handle_save_record),
        )
        .route("/api/v1/records/:id", delete(records::handle_delete_record))
        // Statistics
        .route("/api/v1/stats/daily", get(stats::handle_daily_stats))
        .route("/api/v1/stats/weekly", get(stats::handle_weekly_stats))
        .route("/api/v1/stats/goal", get(stats::handle_goal_progress))
        // Settings
        .route(
            "/api/v1/settings",
            get(settings::handle_get_settings).put(settings::handle_put_setting),
        )
        // Backup
        .route("/api/v1/backup", get(backup::handle_export))
        .route("/api/v1/backup/restore", post(backup::handle_restore))
        .with_state(state)
}
