//! Analysis gateway: turns a model's free-text reply into structured
//! nutrition data.
//!
//! The model is asked for bare JSON, but replies routinely arrive wrapped in
//! markdown code fences or surrounded by prose. The extraction here strips
//! fences, narrows to the outermost object, and parses; anything that still
//! is not JSON surfaces as a parse-failure error carrying the raw text.

pub mod handlers;
pub mod prompts;

use serde::Serialize;
use serde_json::Value;

use crate::models::record::Macronutrients;

/// A fully-populated nutrition estimate, as returned by the text-only
/// lookup path. Every field is filled: absent numbers become zero, absent
/// strings fall back to the request values.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionEstimate {
    pub food_name: String,
    pub portion_size: String,
    pub calories: i64,
    pub macronutrients: Macronutrients,
    pub confidence: f64,
    pub description: String,
}

/// Drops a `data:image/...;base64,` prefix, leaving the raw base64 payload.
pub fn strip_data_url_prefix(image_data: &str) -> &str {
    image_data
        .split_once(',')
        .map(|(_, data)| data)
        .unwrap_or(image_data)
}

/// Extracts the JSON object from a model reply.
///
/// Removes any markdown code fences, then narrows to the span between the
/// first `{` and the last `}` so leading or trailing prose is tolerated.
pub fn extract_json(text: &str) -> Result<Value, serde_json::Error> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let candidate = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start < end => &cleaned[start..=end],
        _ => cleaned,
    };

    serde_json::from_str(candidate)
}

/// Coerces a parsed lookup reply into a complete estimate.
pub fn coerce_estimate(parsed: &Value, food_name: &str, portion_size: &str) -> NutritionEstimate {
    let macros = parsed.get("macronutrients");
    let gram = |field: &str| {
        macros
            .and_then(|m| m.get(field))
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    };

    NutritionEstimate {
        food_name: parsed
            .get("foodName")
            .and_then(Value::as_str)
            .unwrap_or(food_name)
            .to_string(),
        portion_size: parsed
            .get("portionSize")
            .and_then(Value::as_str)
            .unwrap_or(portion_size)
            .to_string(),
        calories: parsed
            .get("calories")
            .and_then(Value::as_f64)
            .map(|c| c.round() as i64)
            .unwrap_or(0),
        macronutrients: Macronutrients {
            carbs: gram("carbs"),
            protein: gram("protein"),
            fat: gram("fat"),
            sugar: gram("sugar"),
        },
        confidence: parsed
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.8),
        description: parsed
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("Nutrition lookup result")
            .to_string(),
    }
}
