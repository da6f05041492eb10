use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use crate::backup::{
    valid_backup_record, valid_backup_shape, BackupData, BackupSettings, RestoreReport,
    BACKUP_VERSION,
};
use crate::errors::AppError;
use crate::records::store::{get_all_records, save_raw_record};
use crate::settings::{get_setting, set_setting, GOAL_CALORIES_KEY};
use crate::state::AppState;

/// GET /api/v1/backup
pub async fn handle_export(State(state): State<AppState>) -> Result<Json<BackupData>, AppError> {
    let records = get_all_records(&state.db).await?;
    let goal_calories = get_setting(&state.db, GOAL_CALORIES_KEY)
        .await?
        .and_then(|v| v.parse::<i64>().ok());

    Ok(Json(BackupData {
        version: BACKUP_VERSION.to_string(),
        export_date: Utc::now().to_rfc3339(),
        records,
        settings: BackupSettings { goal_calories },
    }))
}

/// POST /api/v1/backup/restore
///
/// Imports records one at a time with fresh ids; individually invalid
/// records are skipped and counted out rather than aborting the restore.
pub async fn handle_restore(
    State(state): State<AppState>,
    Json(doc): Json<Value>,
) -> Result<Json<RestoreReport>, AppError> {
    if !valid_backup_shape(&doc) {
        return Err(AppError::Validation("Invalid backup file".to_string()));
    }

    if let Some(goal) = doc
        .get("settings")
        .and_then(|s| s.get("goalCalories"))
        .and_then(Value::as_i64)
        .filter(|g| *g > 0)
    {
        set_setting(&state.db, GOAL_CALORIES_KEY, &goal.to_string()).await?;
    }

    let records = doc
        .get("records")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut restored = 0_usize;
    for record in &records {
        if !valid_backup_record(record) {
            warn!("skipping invalid record in backup restore");
            continue;
        }
        match save_raw_record(&state.db, record).await {
            Ok(_) => restored += 1,
            Err(e) => warn!("failed to restore record: {e}"),
        }
    }

    Ok(Json(RestoreReport {
        success: true,
        message: format!("Restored {restored} of {} records", records.len()),
        records_count: Some(restored),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::config::Config;
    use crate::llm_client::GeminiClient;
    use crate::rate_limit::RateLimiter;
    use crate::records::store::{save_record, test_pool};
    use crate::models::record::{Macronutrients, NewFoodRecord};
    use crate::settings::goal_calories;

    async fn test_state() -> AppState {
        AppState {
            db: test_pool().await,
            llm: GeminiClient::new(None),
            analyzer: Arc::new(GeminiClient::new(None)),
            limiter: Arc::new(RateLimiter::new()),
            config: Config {
                database_url: "sqlite::memory:".to_string(),
                gemini_api_key: None,
                gemini_model: "gemini-1.5-flash".to_string(),
                rate_limit_per_day: 10,
                port: 0,
                rust_log: "info".to_string(),
            },
        }
    }

    fn record_doc(food_name: &str) -> Value {
        json!({
            "timestamp": 1_700_000_000_000_i64,
            "imageData": "",
            "foodName": food_name,
            "portionSize": "1 serving",
            "calories": 400,
            "macronutrients": { "carbs": 40.0, "protein": 20.0, "fat": 10.0, "sugar": 5.0 }
        })
    }

    #[tokio::test]
    async fn test_export_includes_records_and_goal() {
        let state = test_state().await;
        save_record(
            &state.db,
            &NewFoodRecord {
                timestamp: 1_700_000_000_000,
                image_data: String::new(),
                food_name: "Bibimbap".to_string(),
                portion_size: "1 bowl".to_string(),
                calories: 560,
                macronutrients: Macronutrients::default(),
                confidence: None,
                description: None,
            },
        )
        .await
        .unwrap();
        set_setting(&state.db, GOAL_CALORIES_KEY, "1900").await.unwrap();

        let Json(backup) = handle_export(State(state)).await.unwrap();
        assert_eq!(backup.version, BACKUP_VERSION);
        assert_eq!(backup.records.len(), 1);
        assert_eq!(backup.settings.goal_calories, Some(1900));
    }

    #[tokio::test]
    async fn test_restore_imports_and_reports_count() {
        let state = test_state().await;
        let doc = json!({
            "version": "1.0",
            "exportDate": "2024-05-01T09:00:00Z",
            "records": [record_doc("Bibimbap"), record_doc("Kimbap")],
            "settings": { "goalCalories": 2100 }
        });

        let Json(report) = handle_restore(State(state.clone()), Json(doc)).await.unwrap();
        assert!(report.success);
        assert_eq!(report.records_count, Some(2));

        let records = get_all_records(&state.db).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(goal_calories(&state.db).await.unwrap(), 2100);
    }

    #[tokio::test]
    async fn test_restore_skips_invalid_records_without_aborting() {
        let state = test_state().await;
        let doc = json!({
            "version": "1.0",
            "exportDate": "2024-05-01T09:00:00Z",
            "records": [
                record_doc("Bibimbap"),
                { "foodName": "broken, no timestamp", "calories": 100 },
                record_doc("Kimbap")
            ]
        });

        let Json(report) = handle_restore(State(state.clone()), Json(doc)).await.unwrap();
        assert!(report.success);
        assert_eq!(report.records_count, Some(2));
        assert_eq!(get_all_records(&state.db).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_restore_rejects_invalid_shape() {
        let state = test_state().await;
        let err = handle_restore(State(state), Json(json!({ "records": [] })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_restored_records_get_fresh_ids() {
        let state = test_state().await;
        let mut doc_record = record_doc("Bibimbap");
        doc_record["id"] = json!(424_242);
        let doc = json!({
            "version": "1.0",
            "exportDate": "2024-05-01T09:00:00Z",
            "records": [doc_record]
        });

        handle_restore(State(state.clone()), Json(doc)).await.unwrap();
        let records = get_all_records(&state.db).await.unwrap();
        assert_ne!(records[0].id, 424_242);
    }
}
