use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::analysis::prompts::{ANALYZE_FOOD_PROMPT, SEARCH_NUTRITION_PROMPT};
use crate::analysis::{coerce_estimate, extract_json, strip_data_url_prefix};
use crate::errors::{AppError, RATE_LIMIT_LIMIT, RATE_LIMIT_REMAINING, RATE_LIMIT_RESET};
use crate::rate_limit::{client_identifier, RateLimitResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub image_data: String,
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub food_name: String,
    #[serde(default)]
    pub portion_size: String,
    pub model: Option<String>,
}

fn rate_limit_headers(result: &RateLimitResult) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(result.limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(result.remaining));
    headers.insert(RATE_LIMIT_RESET, HeaderValue::from(result.reset_at));
    headers
}

/// Consumes one unit of the caller's daily quota, or fails with the 429
/// shape. The quota is spent even if the analysis afterwards fails.
fn check_quota(state: &AppState, headers: &HeaderMap) -> Result<RateLimitResult, AppError> {
    let identifier = client_identifier(headers);
    let decision = state
        .limiter
        .check(&identifier, state.config.rate_limit_per_day);
    if !decision.success {
        return Err(AppError::QuotaExceeded {
            limit: decision.limit,
            reset_at: decision.reset_at,
        });
    }
    Ok(decision)
}

/// POST /api/v1/analyze
///
/// Forwards the photo to the vision model with the fixed nutrition prompt
/// and returns the parsed estimate verbatim, with `X-RateLimit-*` headers
/// reflecting the post-increment quota state.
pub async fn handle_analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Response, AppError> {
    let quota = check_quota(&state, &headers)?;

    if req.image_data.is_empty() {
        return Err(AppError::Validation("imageData is required".to_string()));
    }

    let model = req.model.as_deref().unwrap_or(&state.config.gemini_model);
    let image = strip_data_url_prefix(&req.image_data);

    let text = state
        .analyzer
        .generate(model, ANALYZE_FOOD_PROMPT, Some(image))
        .await?;

    let parsed = extract_json(&text).map_err(|_| AppError::ModelParse { raw: text.clone() })?;

    Ok((rate_limit_headers(&quota), Json(parsed)).into_response())
}

/// POST /api/v1/analyze/search
///
/// Text-only lookup by food name and portion. The parsed reply is coerced
/// into a fully-populated estimate.
pub async fn handle_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SearchRequest>,
) -> Result<Response, AppError> {
    let quota = check_quota(&state, &headers)?;

    if req.food_name.trim().is_empty() {
        return Err(AppError::Validation("foodName is required".to_string()));
    }

    let model = req.model.as_deref().unwrap_or(&state.config.gemini_model);
    let prompt = SEARCH_NUTRITION_PROMPT
        .replace("{food_name}", &req.food_name)
        .replace("{portion_size}", &req.portion_size);

    let text = state.analyzer.generate(model, &prompt, None).await?;
    let parsed = extract_json(&text).map_err(|_| AppError::ModelParse { raw: text.clone() })?;
    let estimate = coerce_estimate(&parsed, &req.food_name, &req.portion_size);

    Ok((rate_limit_headers(&quota), Json(estimate)).into_response())
}

/// GET /api/v1/models
pub async fn handle_list_models(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let models = state.llm.list_models().await?;
    Ok(Json(models))
}
