//! Commission earnings rolled up from the ledger

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use loyalty_core::{EarningsBreakdown, LedgerEntry};
use std::collections::HashMap;

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(chrono::NaiveTime::MIN))
}

/// Start of the UTC day, ISO week (Monday) and month containing `now`
pub fn period_starts(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let first = today.with_day(1).unwrap_or(today);
    (midnight(today), midnight(monday), midnight(first))
}

/// Sum commission credits into today / this week / this month / all time
pub fn earnings_breakdown(entries: &[LedgerEntry], now: DateTime<Utc>) -> EarningsBreakdown {
    let (day, week, month) = period_starts(now);
    let mut earnings = EarningsBreakdown::default();

    for entry in entries.iter().filter(|e| e.delta > 0) {
        earnings.all_time += entry.delta;
        if entry.created_at >= month {
            earnings.this_month += entry.delta;
        }
        if entry.created_at >= week {
            earnings.this_week += entry.delta;
        }
        if entry.created_at >= day {
            earnings.today += entry.delta;
        }
    }
    earnings
}

/// Commission per referee, keyed by the entry's reference
pub fn commission_by_referee(entries: &[LedgerEntry]) -> HashMap<String, i64> {
    let mut totals = HashMap::new();
    for entry in entries {
        if let Some(referee) = &entry.reference {
            *totals.entry(referee.clone()).or_insert(0) += entry.delta;
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use loyalty_core::{Currency, LedgerReason, PlayerId};

    fn credit(delta: i64, at: DateTime<Utc>, referee: &str) -> LedgerEntry {
        LedgerEntry {
            id: 0,
            player_id: PlayerId::parse("root").unwrap(),
            currency: Currency::Tickets,
            delta,
            balance_after: 0,
            reason: LedgerReason::ReferralCommission,
            reference: Some(referee.to_string()),
            created_at: at,
        }
    }

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_period_starts() {
        // 2024-03-13 is a Wednesday
        let (day, week, month) = period_starts(at(13, 10));
        assert_eq!(day, at(13, 0));
        assert_eq!(week, at(11, 0));
        assert_eq!(month, at(1, 0));
    }

    #[test]
    fn test_breakdown_buckets() {
        let entries = vec![
            credit(1, at(13, 9), "a"),
            credit(2, at(11, 0), "b"),
            credit(4, at(1, 0), "a"),
            credit(8, Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap(), "a"),
        ];
        let earnings = earnings_breakdown(&entries, at(13, 10));
        assert_eq!(
            earnings,
            EarningsBreakdown {
                today: 1,
                this_week: 3,
                this_month: 7,
                all_time: 15,
            }
        );

        let by_referee = commission_by_referee(&entries);
        assert_eq!(by_referee["a"], 13);
        assert_eq!(by_referee["b"], 2);
    }
}
