use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::settings::{all_settings, set_setting, ALLOWED_KEYS, GOAL_CALORIES_KEY};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SettingUpdate {
    pub key: String,
    pub value: String,
}

/// GET /api/v1/settings
pub async fn handle_get_settings(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, String>>, AppError> {
    let settings = all_settings(&state.db).await?;
    Ok(Json(settings))
}

/// PUT /api/v1/settings
pub async fn handle_put_setting(
    State(state): State<AppState>,
    Json(update): Json<SettingUpdate>,
) -> Result<StatusCode, AppError> {
    if !ALLOWED_KEYS.contains(&update.key.as_str()) {
        return Err(AppError::Validation(format!(
            "Unknown setting '{}'",
            update.key
        )));
    }

    if update.key == GOAL_CALORIES_KEY
        && update.value.parse::<i64>().map_or(true, |v| v <= 0)
    {
        return Err(AppError::Validation(
            "goal_calories must be a positive integer".to_string(),
        ));
    }

    set_setting(&state.db, &update.key, &update.value).await?;
    Ok(StatusCode::NO_CONTENT)
}
