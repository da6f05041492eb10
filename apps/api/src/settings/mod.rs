//! String preferences, stored in a small key-value table.
//!
//! Only a fixed allowlist of keys exists. The upstream API credential is
//! server-side configuration and is deliberately not a setting: it is never
//! stored in the database or returned to clients.

pub mod handlers;

use std::collections::BTreeMap;

use sqlx::{Row, SqlitePool};

pub const GOAL_CALORIES_KEY: &str = "goal_calories";

/// Keys clients may read and write.
pub const ALLOWED_KEYS: &[&str] = &[GOAL_CALORIES_KEY, "model", "device_id"];

/// Fallback daily goal when no preference has been stored.
pub const DEFAULT_GOAL_CALORIES: i64 = 2000;

pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>, sqlx::Error> {
    let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.get("value")))
}

pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn all_settings(pool: &SqlitePool) -> Result<BTreeMap<String, String>, sqlx::Error> {
    let rows = sqlx::query("SELECT key, value FROM settings")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|r| (r.get("key"), r.get("value")))
        .collect())
}

/// Reads the stored goal, falling back to the default when absent or
/// unparseable.
pub async fn goal_calories(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    Ok(get_setting(pool, GOAL_CALORIES_KEY)
        .await?
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_GOAL_CALORIES))
}
