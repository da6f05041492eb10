use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

/// Creates the SQLite pool and ensures the schema exists.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Opening SQLite database...");

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    init_schema(&pool).await?;

    info!("SQLite database ready");
    Ok(pool)
}

/// Idempotent schema setup. Records are a key-value table: an
/// auto-increment key and a JSON document; the read path owns any shape
/// migration, so the stored documents are never rewritten.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS food_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            data TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}
