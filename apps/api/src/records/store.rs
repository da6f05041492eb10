//! Food-record persistence: an append-only key-value table of JSON documents.
//!
//! `save` assigns the next auto-increment id; `get_all` applies a read-time
//! compatibility shim for documents written under older layouts; `delete`
//! removes by id. There is no update-in-place — an edit is a new analysis
//! saved as a new record. Stored documents are never rewritten by the shim.

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use tracing::warn;

use crate::models::record::{FoodRecord, Macronutrients, NewFoodRecord};

/// A stored document in any historical layout. Current documents carry a
/// nested `macronutrients` object; legacy documents carried the four grams
/// fields flat at the top level, or nothing at all.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    image_data: String,
    #[serde(default)]
    food_name: String,
    #[serde(default)]
    portion_size: String,
    #[serde(default)]
    calories: i64,
    macronutrients: Option<Macronutrients>,
    // Legacy flat layout.
    carbs: Option<f64>,
    protein: Option<f64>,
    fat: Option<f64>,
    sugar: Option<f64>,
    confidence: Option<f64>,
    description: Option<String>,
}

/// Normalizes a stored document into the current shape.
///
/// Precedence: a nested macronutrients object wins; otherwise a flat
/// `carbs` field marks the legacy layout and the four grams fields are
/// lifted (absent ones as zero); otherwise the breakdown is backfilled
/// with zeros.
fn normalize(id: i64, doc: StoredRecord) -> FoodRecord {
    let macronutrients = match doc.macronutrients {
        Some(m) => m,
        None if doc.carbs.is_some() => Macronutrients {
            carbs: doc.carbs.unwrap_or(0.0),
            protein: doc.protein.unwrap_or(0.0),
            fat: doc.fat.unwrap_or(0.0),
            sugar: doc.sugar.unwrap_or(0.0),
        },
        None => Macronutrients::default(),
    };

    FoodRecord {
        id,
        timestamp: doc.timestamp,
        image_data: doc.image_data,
        food_name: doc.food_name,
        portion_size: doc.portion_size,
        calories: doc.calories,
        macronutrients,
        confidence: doc.confidence,
        description: doc.description,
    }
}

/// Appends a record, returning the assigned id.
pub async fn save_record(pool: &SqlitePool, record: &NewFoodRecord) -> Result<i64> {
    let data = serde_json::to_string(record)?;
    let result = sqlx::query("INSERT INTO food_records (data) VALUES (?)")
        .bind(&data)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Appends a raw JSON document as-is, stripping any carried `id` so the
/// store assigns a fresh one. Used by backup restore, where legacy-layout
/// documents must survive round-tripping untouched.
pub async fn save_raw_record(pool: &SqlitePool, doc: &Value) -> Result<i64> {
    let mut doc = doc.clone();
    if let Some(obj) = doc.as_object_mut() {
        obj.remove("id");
    }
    let data = serde_json::to_string(&doc)?;
    let result = sqlx::query("INSERT INTO food_records (data) VALUES (?)")
        .bind(&data)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Returns every record, oldest first, normalized through the shim.
/// Unreadable documents are skipped rather than failing the whole read.
pub async fn get_all_records(pool: &SqlitePool) -> Result<Vec<FoodRecord>> {
    let rows = sqlx::query("SELECT id, data FROM food_records ORDER BY id")
        .fetch_all(pool)
        .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let id: i64 = row.get("id");
        let data: String = row.get("data");
        match serde_json::from_str::<StoredRecord>(&data) {
            Ok(doc) => records.push(normalize(id, doc)),
            Err(e) => warn!("skipping unreadable record {id}: {e}"),
        }
    }
    Ok(records)
}

/// Deletes by id. Returns whether a record was actually removed.
pub async fn delete_record(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM food_records WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    use sqlx::sqlite::SqlitePoolOptions;

    // A single connection keeps every statement on the same in-memory db.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    crate::db::init_schema(&pool).await.expect("schema");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record(calories: i64) -> NewFoodRecord {
        NewFoodRecord {
            timestamp: 1_700_000_000_000,
            image_data: "data:image/jpeg;base64,QUJD".to_string(),
            food_name: "Bibimbap".to_string(),
            portion_size: "1 bowl".to_string(),
            calories,
            macronutrients: Macronutrients {
                carbs: 80.0,
                protein: 20.0,
                fat: 15.0,
                sugar: 8.0,
            },
            confidence: Some(0.9),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_save_assigns_increasing_ids() {
        let pool = test_pool().await;
        let first = save_record(&pool, &sample_record(500)).await.unwrap();
        let second = save_record(&pool, &sample_record(600)).await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_get_all_round_trips_native_shape() {
        let pool = test_pool().await;
        let id = save_record(&pool, &sample_record(520)).await.unwrap();

        let records = get_all_records(&pool).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].calories, 520);
        assert_eq!(records[0].macronutrients.carbs, 80.0);
        assert_eq!(records[0].confidence, Some(0.9));
    }

    #[tokio::test]
    async fn test_legacy_flat_shape_normalizes_like_native() {
        let pool = test_pool().await;

        save_raw_record(
            &pool,
            &json!({
                "timestamp": 1_700_000_000_000_i64,
                "imageData": "data:image/jpeg;base64,QUJD",
                "foodName": "Kimchi stew",
                "portionSize": "1 bowl",
                "calories": 320,
                "carbs": 18.0,
                "protein": 22.0,
                "fat": 14.0,
                "sugar": 6.0
            }),
        )
        .await
        .unwrap();

        save_raw_record(
            &pool,
            &json!({
                "timestamp": 1_700_000_000_000_i64,
                "imageData": "data:image/jpeg;base64,QUJD",
                "foodName": "Kimchi stew",
                "portionSize": "1 bowl",
                "calories": 320,
                "macronutrients": { "carbs": 18.0, "protein": 22.0, "fat": 14.0, "sugar": 6.0 }
            }),
        )
        .await
        .unwrap();

        let records = get_all_records(&pool).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].macronutrients, records[1].macronutrients);
        assert_eq!(records[0].calories, records[1].calories);
    }

    #[tokio::test]
    async fn test_record_without_macros_backfills_zeros() {
        let pool = test_pool().await;
        save_raw_record(
            &pool,
            &json!({
                "timestamp": 1_700_000_000_000_i64,
                "foodName": "Unknown snack",
                "portionSize": "1 piece",
                "calories": 150
            }),
        )
        .await
        .unwrap();

        let records = get_all_records(&pool).await.unwrap();
        assert_eq!(records[0].macronutrients, Macronutrients::default());
    }

    #[tokio::test]
    async fn test_partial_flat_shape_zero_fills_missing_grams() {
        let pool = test_pool().await;
        save_raw_record(
            &pool,
            &json!({
                "timestamp": 1_700_000_000_000_i64,
                "foodName": "Rice",
                "portionSize": "1 bowl",
                "calories": 300,
                "carbs": 65.0
            }),
        )
        .await
        .unwrap();

        let records = get_all_records(&pool).await.unwrap();
        let m = records[0].macronutrients;
        assert_eq!(m.carbs, 65.0);
        assert_eq!(m.protein, 0.0);
        assert_eq!(m.fat, 0.0);
        assert_eq!(m.sugar, 0.0);
    }

    #[tokio::test]
    async fn test_save_raw_strips_carried_id() {
        let pool = test_pool().await;
        let id = save_raw_record(
            &pool,
            &json!({
                "id": 9999,
                "timestamp": 1_700_000_000_000_i64,
                "foodName": "Salad",
                "portionSize": "1 plate",
                "calories": 120
            }),
        )
        .await
        .unwrap();

        assert_ne!(id, 9999);
        let records = get_all_records(&pool).await.unwrap();
        assert_eq!(records[0].id, id);
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let pool = test_pool().await;
        let id = save_record(&pool, &sample_record(400)).await.unwrap();

        assert!(delete_record(&pool, id).await.unwrap());
        assert!(get_all_records(&pool).await.unwrap().is_empty());

        // Deleting again reports nothing removed.
        assert!(!delete_record(&pool, id).await.unwrap());
    }
}
