//! Backup: the only durable interchange schema.
//!
//! `{version, exportDate, records[], settings: {goalCalories?}}`. Export
//! passes records through the store's read-time shim; restore validates the
//! top-level shape, then imports records one at a time with fresh ids,
//! skipping individually invalid ones instead of aborting the whole run.

pub mod handlers;

use serde::Serialize;
use serde_json::Value;

use crate::models::record::FoodRecord;

pub const BACKUP_VERSION: &str = "1.0";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    pub version: String,
    pub export_date: String,
    pub records: Vec<FoodRecord>,
    pub settings: BackupSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_calories: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_count: Option<usize>,
}

/// Top-level shape check: version and exportDate strings, records array.
pub fn valid_backup_shape(doc: &Value) -> bool {
    doc.get("version").map_or(false, Value::is_string)
        && doc.get("exportDate").map_or(false, Value::is_string)
        && doc.get("records").map_or(false, Value::is_array)
}

/// Per-record check: a restorable record carries a numeric timestamp, a
/// string foodName, and a numeric calories field. Everything else (legacy
/// flat macros included) is carried through as-is and left to the read shim.
pub fn valid_backup_record(record: &Value) -> bool {
    record.get("timestamp").map_or(false, Value::is_number)
        && record.get("foodName").map_or(false, Value::is_string)
        && record.get("calories").map_or(false, Value::is_number)
}
