use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::errors::AppError;
use crate::records::store::get_all_records;
use crate::settings;
use crate::state::AppState;
use crate::stats::{
    calculate_daily_stats, calculate_goal_progress, calculate_weekly_stats, DailyStats,
    GoalProgress, WeeklyStats,
};

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct GoalQuery {
    pub goal: Option<i64>,
}

/// GET /api/v1/stats/daily?date=YYYY-MM-DD (default: today)
pub async fn handle_daily_stats(
    State(state): State<AppState>,
    Query(query): Query<DailyQuery>,
) -> Result<Json<DailyStats>, AppError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let records = get_all_records(&state.db).await?;
    Ok(Json(calculate_daily_stats(&records, date)))
}

/// GET /api/v1/stats/weekly
pub async fn handle_weekly_stats(
    State(state): State<AppState>,
) -> Result<Json<WeeklyStats>, AppError> {
    let records = get_all_records(&state.db).await?;
    Ok(Json(calculate_weekly_stats(
        &records,
        Utc::now().date_naive(),
    )))
}

/// GET /api/v1/stats/goal?goal=N (default: the stored goal preference)
pub async fn handle_goal_progress(
    State(state): State<AppState>,
    Query(query): Query<GoalQuery>,
) -> Result<Json<GoalProgress>, AppError> {
    let goal = match query.goal {
        Some(goal) if goal > 0 => goal,
        Some(_) => {
            return Err(AppError::Validation(
                "goal must be a positive integer".to_string(),
            ))
        }
        None => settings::goal_calories(&state.db).await?,
    };

    let records = get_all_records(&state.db).await?;
    let today = calculate_daily_stats(&records, Utc::now().date_naive());
    Ok(Json(calculate_goal_progress(today.total_calories, goal)))
}
