use serde::{Deserialize, Serialize};

/// Macronutrient breakdown in grams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Macronutrients {
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub sugar: f64,
}

/// One logged meal with its nutrition estimate, as returned by the store.
///
/// The macronutrients object is always present after read; the store's
/// compatibility shim backfills it for records written before the nested
/// layout existed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodRecord {
    pub id: i64,
    /// Capture time, epoch milliseconds.
    pub timestamp: i64,
    /// Encoded still image (data URL).
    pub image_data: String,
    pub food_name: String,
    pub portion_size: String,
    /// Integer kcal.
    pub calories: i64,
    pub macronutrients: Macronutrients,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A record as submitted for insertion. The store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFoodRecord {
    pub timestamp: i64,
    pub image_data: String,
    pub food_name: String,
    pub portion_size: String,
    pub calories: i64,
    #[serde(default)]
    pub macronutrients: Macronutrients,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
