//! Virtual currency balances and the append-only ledger

use chrono::{DateTime, TimeZone, Utc};
use loyalty_core::{
    Currency, Error, LedgerEntry, LedgerMemo, LedgerQuery, LedgerReason, PlayerId, Result,
};
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Database row for a ledger entry
#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    id: i64,
    player_id: String,
    currency: String,
    delta: i64,
    balance_after: i64,
    reason: String,
    reference: Option<String>,
    created_at_ms: i64,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = Error;

    fn try_from(row: LedgerRow) -> Result<Self> {
        let created_at: DateTime<Utc> = Utc
            .timestamp_millis_opt(row.created_at_ms)
            .single()
            .ok_or_else(|| Error::InvalidData(format!("bad ledger timestamp {}", row.created_at_ms)))?;

        Ok(LedgerEntry {
            id: row.id,
            player_id: PlayerId::parse(&row.player_id)?,
            currency: Currency::from_code(&row.currency)?,
            delta: row.delta,
            balance_after: row.balance_after,
            reason: LedgerReason::parse(&row.reason)?,
            reference: row.reference,
            created_at,
        })
    }
}

fn require_positive(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(Error::InvalidArgument(format!(
            "currency amount must be positive, got {}",
            amount
        )));
    }
    Ok(())
}

/// Current balance (0 for players who never held the currency)
pub async fn get_balance(pool: &SqlitePool, player: &PlayerId, currency: Currency) -> Result<i64> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT amount FROM balances WHERE player_id = ? AND currency = ?")
            .bind(player.as_str())
            .bind(currency.code())
            .fetch_optional(pool)
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(row.map(|r| r.0).unwrap_or(0))
}

async fn append_entry(
    tx: &mut Transaction<'_, Sqlite>,
    player: &PlayerId,
    currency: Currency,
    delta: i64,
    balance_after: i64,
    memo: &LedgerMemo,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO currency_ledger
            (player_id, currency, delta, balance_after, reason, reference, created_at_ms)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(player.as_str())
    .bind(currency.code())
    .bind(delta)
    .bind(balance_after)
    .bind(memo.reason.as_str())
    .bind(memo.reference.as_deref())
    .bind(memo.at.timestamp_millis())
    .execute(&mut **tx)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

/// Credit a balance and record it, in one transaction. Returns the new balance.
pub async fn add_currency(
    pool: &SqlitePool,
    player: &PlayerId,
    currency: Currency,
    amount: i64,
    memo: &LedgerMemo,
) -> Result<i64> {
    require_positive(amount)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    let (balance,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO balances (player_id, currency, amount)
        VALUES (?, ?, ?)
        ON CONFLICT(player_id, currency) DO UPDATE SET amount = balances.amount + excluded.amount
        RETURNING amount
        "#,
    )
    .bind(player.as_str())
    .bind(currency.code())
    .bind(amount)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    append_entry(&mut tx, player, currency, amount, balance, memo).await?;

    tx.commit()
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(balance)
}

/// Debit a balance if it covers `amount`. Returns the new balance.
pub async fn subtract_currency(
    pool: &SqlitePool,
    player: &PlayerId,
    currency: Currency,
    amount: i64,
    memo: &LedgerMemo,
) -> Result<i64> {
    require_positive(amount)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        UPDATE balances SET amount = amount - ?
        WHERE player_id = ? AND currency = ? AND amount >= ?
        RETURNING amount
        "#,
    )
    .bind(amount)
    .bind(player.as_str())
    .bind(currency.code())
    .bind(amount)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    let Some((balance,)) = row else {
        tx.rollback()
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))?;
        let available = get_balance(pool, player, currency).await?;
        return Err(Error::InsufficientBalance {
            required: amount,
            available,
        });
    };

    append_entry(&mut tx, player, currency, -amount, balance, memo).await?;

    tx.commit()
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(balance)
}

/// Ledger entries for a player, newest first
pub async fn list_ledger_entries(
    pool: &SqlitePool,
    player: &PlayerId,
    query: &LedgerQuery,
) -> Result<Vec<LedgerEntry>> {
    let mut sql = String::from(
        r#"
        SELECT id, player_id, currency, delta, balance_after, reason, reference, created_at_ms
        FROM currency_ledger
        WHERE player_id = ?
        "#,
    );

    if query.reason.is_some() {
        sql.push_str(" AND reason = ?");
    }
    if query.since.is_some() {
        sql.push_str(" AND created_at_ms >= ?");
    }

    sql.push_str(" ORDER BY created_at_ms DESC, id DESC");
    if query.limit.is_some() {
        sql.push_str(" LIMIT ?");
    }

    let mut builder = sqlx::query_as::<_, LedgerRow>(&sql).bind(player.as_str());

    if let Some(reason) = query.reason {
        builder = builder.bind(reason.as_str());
    }
    if let Some(since) = query.since {
        builder = builder.bind(since.timestamp_millis());
    }
    if let Some(limit) = query.limit {
        builder = builder.bind(i64::from(limit));
    }

    let rows = builder
        .fetch_all(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    rows.into_iter().map(LedgerEntry::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use chrono::Duration;

    fn memo(reason: LedgerReason, at: DateTime<Utc>) -> LedgerMemo {
        LedgerMemo::new(reason, at)
    }

    #[tokio::test]
    async fn test_add_then_subtract() {
        let db = Database::connect_in_memory().await.unwrap();
        let p = PlayerId::parse("p1").unwrap();
        let now = Utc::now();

        assert_eq!(get_balance(db.pool(), &p, Currency::Tickets).await.unwrap(), 0);
        let after_add = add_currency(db.pool(), &p, Currency::Tickets, 30, &memo(LedgerReason::DailyReward, now))
            .await
            .unwrap();
        assert_eq!(after_add, 30);

        let after_sub = subtract_currency(db.pool(), &p, Currency::Tickets, 12, &memo(LedgerReason::RaffleEntry, now))
            .await
            .unwrap();
        assert_eq!(after_sub, 18);
        assert_eq!(get_balance(db.pool(), &p, Currency::Points).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_overdraft_is_rejected_without_side_effects() {
        let db = Database::connect_in_memory().await.unwrap();
        let p = PlayerId::parse("p1").unwrap();
        let now = Utc::now();
        add_currency(db.pool(), &p, Currency::Tickets, 5, &memo(LedgerReason::Adjustment, now))
            .await
            .unwrap();

        let err = subtract_currency(db.pool(), &p, Currency::Tickets, 6, &memo(LedgerReason::WheelSpinCost, now))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientBalance { required: 6, available: 5 }
        ));
        assert_eq!(get_balance(db.pool(), &p, Currency::Tickets).await.unwrap(), 5);

        let entries = list_ledger_entries(db.pool(), &p, &LedgerQuery::default()).await.unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_non_positive_amounts_rejected() {
        let db = Database::connect_in_memory().await.unwrap();
        let p = PlayerId::parse("p1").unwrap();
        let m = memo(LedgerReason::Adjustment, Utc::now());
        assert!(add_currency(db.pool(), &p, Currency::Tickets, 0, &m).await.is_err());
        assert!(subtract_currency(db.pool(), &p, Currency::Tickets, -3, &m).await.is_err());
    }

    #[tokio::test]
    async fn test_ledger_filters() {
        let db = Database::connect_in_memory().await.unwrap();
        let p = PlayerId::parse("p1").unwrap();
        let now = Utc::now();
        let old = now - Duration::days(10);

        add_currency(db.pool(), &p, Currency::Tickets, 3, &memo(LedgerReason::ReferralCommission, old).with_reference("r1"))
            .await
            .unwrap();
        add_currency(db.pool(), &p, Currency::Tickets, 4, &memo(LedgerReason::ReferralCommission, now).with_reference("r2"))
            .await
            .unwrap();
        add_currency(db.pool(), &p, Currency::Tickets, 10, &memo(LedgerReason::DailyReward, now))
            .await
            .unwrap();

        let commissions = list_ledger_entries(db.pool(), &p, &LedgerQuery::reason(LedgerReason::ReferralCommission))
            .await
            .unwrap();
        assert_eq!(commissions.len(), 2);
        assert_eq!(commissions[0].reference.as_deref(), Some("r2"));

        let recent = LedgerQuery {
            reason: Some(LedgerReason::ReferralCommission),
            since: Some(now - Duration::days(1)),
            limit: None,
        };
        let recent = list_ledger_entries(db.pool(), &p, &recent).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].balance_after, 7);

        let latest = list_ledger_entries(db.pool(), &p, &LedgerQuery::latest(1)).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].reason, LedgerReason::DailyReward);
    }
}
