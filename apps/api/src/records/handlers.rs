use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::record::{FoodRecord, NewFoodRecord};
use crate::records::store::{delete_record, get_all_records, save_record};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SavedRecord {
    pub id: i64,
}

/// GET /api/v1/records
pub async fn handle_list_records(
    State(state): State<AppState>,
) -> Result<Json<Vec<FoodRecord>>, AppError> {
    let records = get_all_records(&state.db).await?;
    Ok(Json(records))
}

/// POST /api/v1/records
pub async fn handle_save_record(
    State(state): State<AppState>,
    Json(record): Json<NewFoodRecord>,
) -> Result<(StatusCode, Json<SavedRecord>), AppError> {
    let id = save_record(&state.db, &record).await?;
    Ok((StatusCode::CREATED, Json(SavedRecord { id })))
}

/// DELETE /api/v1/records/:id
pub async fn handle_delete_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if delete_record(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Record {id} not found")))
    }
}
