//! Currency ledger models

use crate::{Currency, Error, PlayerId, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a balance moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerReason {
    DailyReward,
    ReferralCommission,
    WheelSpinCost,
    WheelPrize,
    RaffleEntry,
    Adjustment,
}

impl LedgerReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerReason::DailyReward => "daily_reward",
            LedgerReason::ReferralCommission => "referral_commission",
            LedgerReason::WheelSpinCost => "wheel_spin_cost",
            LedgerReason::WheelPrize => "wheel_prize",
            LedgerReason::RaffleEntry => "raffle_entry",
            LedgerReason::Adjustment => "adjustment",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "daily_reward" => Ok(LedgerReason::DailyReward),
            "referral_commission" => Ok(LedgerReason::ReferralCommission),
            "wheel_spin_cost" => Ok(LedgerReason::WheelSpinCost),
            "wheel_prize" => Ok(LedgerReason::WheelPrize),
            "raffle_entry" => Ok(LedgerReason::RaffleEntry),
            "adjustment" => Ok(LedgerReason::Adjustment),
            other => Err(Error::InvalidData(format!("unknown ledger reason {}", other))),
        }
    }
}

/// Context recorded alongside a currency mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerMemo {
    pub reason: LedgerReason,
    /// Related entity: referee id, raffle id, reward day
    pub reference: Option<String>,
    pub at: DateTime<Utc>,
}

impl LedgerMemo {
    pub fn new(reason: LedgerReason, at: DateTime<Utc>) -> Self {
        Self {
            reason,
            reference: None,
            at,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// One row of a player's currency history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: i64,
    pub player_id: PlayerId,
    pub currency: Currency,
    /// Signed change (negative for debits)
    pub delta: i64,
    pub balance_after: i64,
    pub reason: LedgerReason,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Filter for ledger reads; results are newest first
#[derive(Debug, Clone, Default)]
pub struct LedgerQuery {
    pub reason: Option<LedgerReason>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

impl LedgerQuery {
    pub fn reason(reason: LedgerReason) -> Self {
        Self {
            reason: Some(reason),
            ..Default::default()
        }
    }

    pub fn latest(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    /// Whether `entry` passes the reason and time filters (limit not applied)
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.reason.map_or(true, |r| r == entry.reason)
            && self.since.map_or(true, |s| entry.created_at >= s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_round_trips_through_column_text() {
        for reason in [
            LedgerReason::DailyReward,
            LedgerReason::ReferralCommission,
            LedgerReason::WheelSpinCost,
            LedgerReason::WheelPrize,
            LedgerReason::RaffleEntry,
            LedgerReason::Adjustment,
        ] {
            assert_eq!(LedgerReason::parse(reason.as_str()).unwrap(), reason);
        }
        assert!(LedgerReason::parse("gift").is_err());
    }
}
