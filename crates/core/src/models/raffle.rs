//! Raffle models

use crate::Currency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Settings key the current raffle is stored under
pub const CURRENT_RAFFLE_KEY: &str = "current_raffle";

/// The raffle currently open for entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Raffle {
    pub id: String,
    pub title: String,
    pub ticket_cost: i64,
    pub currency: Currency,
    pub ends_at: DateTime<Utc>,
    /// Set when an operator ends the raffle early
    #[serde(default)]
    pub closed: bool,
}

impl Raffle {
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.closed || now >= self.ends_at
    }
}

/// Raffle as shown to players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaffleView {
    #[serde(flatten)]
    pub raffle: Raffle,
    pub ended: bool,
}

/// Confirmed raffle entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaffleEntryReceipt {
    pub raffle_id: String,
    pub tickets_spent: i64,
    /// Balance left after paying for the entry
    pub balance: i64,
}
