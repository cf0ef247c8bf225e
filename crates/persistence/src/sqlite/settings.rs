//! Title-wide settings stored as JSON strings

use loyalty_core::{Error, Result};
use sqlx::SqlitePool;

/// Read a setting value
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    sqlx::query_scalar::<sqlx::Sqlite, String>("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))
}

/// Insert or replace a setting value
pub async fn put_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = ?2",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

/// Conditional overwrite: succeeds only if the value is still what the caller read
pub async fn replace_setting(
    pool: &SqlitePool,
    key: &str,
    expected: &str,
    value: &str,
) -> Result<bool> {
    let result = sqlx::query("UPDATE settings SET value = ? WHERE key = ? AND value = ?")
        .bind(value)
        .bind(key)
        .bind(expected)
        .execute(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected() == 1)
}
