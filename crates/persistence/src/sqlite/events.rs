//! Analytics event log

use chrono::{DateTime, TimeZone, Utc};
use loyalty_core::{AnalyticsEvent, Error, EventRecord, PlayerId, Result};
use sqlx::SqlitePool;

/// Append an event
pub async fn record_event(
    pool: &SqlitePool,
    event: &AnalyticsEvent,
    at: DateTime<Utc>,
) -> Result<i64> {
    let body = serde_json::to_string(event)?;

    let result = sqlx::query(
        r#"
        INSERT INTO analytics_events (event_name, player_id, body, created_at_ms)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(event.name())
    .bind(event.subject().as_str())
    .bind(&body)
    .bind(at.timestamp_millis())
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.last_insert_rowid())
}

/// Events filed under a player, newest first
pub async fn list_events(
    pool: &SqlitePool,
    player: &PlayerId,
    limit: u32,
) -> Result<Vec<EventRecord>> {
    let rows: Vec<(i64, String, i64)> = sqlx::query_as(
        r#"
        SELECT id, body, created_at_ms
        FROM analytics_events
        WHERE player_id = ?
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(player.as_str())
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    rows.into_iter()
        .map(|(id, body, created_at_ms)| {
            let created_at = Utc
                .timestamp_millis_opt(created_at_ms)
                .single()
                .ok_or_else(|| Error::InvalidData(format!("bad event timestamp {}", created_at_ms)))?;
            Ok(EventRecord {
                id,
                event: serde_json::from_str(&body)?,
                created_at,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_events_are_filed_under_subject() {
        let db = Database::connect_in_memory().await.unwrap();
        let referrer = PlayerId::parse("referrer").unwrap();
        let referee = PlayerId::parse("referee").unwrap();

        let event = AnalyticsEvent::ReferralCommissionGranted {
            referrer_id: referrer.clone(),
            referee_id: referee.clone(),
            commission_amount: 4,
            original_amount: 97,
            commission_rate: loyalty_core::CommissionRate(0.05),
        };
        record_event(db.pool(), &event, Utc::now()).await.unwrap();

        let stored = list_events(db.pool(), &referrer, 10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].event, event);
        assert!(list_events(db.pool(), &referee, 10).await.unwrap().is_empty());
    }
}
