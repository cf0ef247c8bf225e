//! Referral code directory, one row per code

use loyalty_core::{Error, PlayerId, ReferralCode, Result};
use sqlx::SqlitePool;

/// Bind a code to a player. Returns false if the code is already taken.
pub async fn claim_referral_code(
    pool: &SqlitePool,
    code: &ReferralCode,
    player: &PlayerId,
) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO referral_codes (code, player_id) VALUES (?, ?) ON CONFLICT(code) DO NOTHING",
    )
    .bind(code.as_str())
    .bind(player.as_str())
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected() == 1)
}

/// Look up the owner of a code
pub async fn resolve_referral_code(
    pool: &SqlitePool,
    code: &ReferralCode,
) -> Result<Option<PlayerId>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT player_id FROM referral_codes WHERE code = ?")
            .bind(code.as_str())
            .fetch_optional(pool)
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))?;

    row.map(|(id,)| PlayerId::parse(&id)).transpose()
}

/// Number of registered codes
pub async fn count_referral_codes(pool: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM referral_codes")
        .fetch_one(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))
}
