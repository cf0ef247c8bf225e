//! Player accounts and per-player key/value data

use loyalty_core::{Error, PlayerId, Result, VersionedField};
use sqlx::SqlitePool;

/// Register a player account (stands in for the platform's account creation).
/// Returns false if the player already existed.
pub async fn create_player(pool: &SqlitePool, player: &PlayerId) -> Result<bool> {
    let result = sqlx::query("INSERT OR IGNORE INTO players (player_id) VALUES (?)")
        .bind(player.as_str())
        .execute(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected() == 1)
}

/// Check if a player account exists
pub async fn player_exists(pool: &SqlitePool, player: &PlayerId) -> Result<bool> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM players WHERE player_id = ?")
        .bind(player.as_str())
        .fetch_one(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(count.0 > 0)
}

/// Read one data field with its version
pub async fn get_field(
    pool: &SqlitePool,
    player: &PlayerId,
    key: &str,
) -> Result<Option<VersionedField>> {
    let row: Option<(String, i64)> = sqlx::query_as(
        "SELECT value, version FROM player_data WHERE player_id = ? AND key = ?",
    )
    .bind(player.as_str())
    .bind(key)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(row.map(|(value, version)| VersionedField { value, version }))
}

/// Overwrite a data field, bumping its version
pub async fn set_field(pool: &SqlitePool, player: &PlayerId, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO player_data (player_id, key, value, version)
        VALUES (?, ?, ?, 1)
        ON CONFLICT(player_id, key) DO UPDATE SET
            value = excluded.value,
            version = player_data.version + 1,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(player.as_str())
    .bind(key)
    .bind(value)
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

/// Conditional write: succeeds only if the version matches what the caller read
pub async fn compare_and_set_field(
    pool: &SqlitePool,
    player: &PlayerId,
    key: &str,
    value: &str,
    expected_version: Option<i64>,
) -> Result<bool> {
    let result = match expected_version {
        None => sqlx::query(
            r#"
            INSERT INTO player_data (player_id, key, value, version)
            VALUES (?, ?, ?, 1)
            ON CONFLICT(player_id, key) DO NOTHING
            "#,
        )
        .bind(player.as_str())
        .bind(key)
        .bind(value)
        .execute(pool)
        .await,
        Some(version) => sqlx::query(
            r#"
            UPDATE player_data
            SET value = ?, version = version + 1, updated_at = CURRENT_TIMESTAMP
            WHERE player_id = ? AND key = ? AND version = ?
            "#,
        )
        .bind(value)
        .bind(player.as_str())
        .bind(key)
        .bind(version)
        .execute(pool)
        .await,
    }
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected() == 1)
}

/// Players whose `key` field holds exactly `value`
pub async fn find_players_by_field(
    pool: &SqlitePool,
    key: &str,
    value: &str,
) -> Result<Vec<PlayerId>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT player_id FROM player_data WHERE key = ? AND value = ? ORDER BY player_id",
    )
    .bind(key)
    .bind(value)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    rows.into_iter()
        .map(|(id,)| PlayerId::parse(&id))
        .collect()
}
