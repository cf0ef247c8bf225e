//! Daily reward streak models

use crate::Currency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Days in one reward cycle
pub const REWARD_COUNT: usize = 5;

/// Player data key the streak blob is stored under
pub const REWARD_STATE_KEY: &str = "dailyRewardState";

/// Per-player streak blob, stored as JSON under [`REWARD_STATE_KEY`]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRewardState {
    /// Days already claimed in the current cycle (0..=REWARD_COUNT)
    #[serde(default)]
    pub streak: u32,
    /// Time of the most recent successful claim
    #[serde(default)]
    pub last_claimed: Option<DateTime<Utc>>,
    /// Authoritative ticket balance right after the last claim
    #[serde(default)]
    pub last_balance: Option<i64>,
}

/// Reward table and currency for the daily cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardConfig {
    pub currency: Currency,
    /// Index 0 is day 1's reward
    pub rewards: Vec<i64>,
}

impl RewardConfig {
    /// Cycle length
    pub fn cycle_len(&self) -> usize {
        self.rewards.len()
    }

    /// Reward for a claim made with `streak` days already claimed
    pub fn reward_for(&self, streak: u32) -> Option<i64> {
        self.rewards.get(streak as usize).copied()
    }

    pub fn is_valid(&self) -> bool {
        !self.rewards.is_empty() && self.rewards.iter().all(|r| *r > 0)
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            currency: Currency::Tickets,
            rewards: vec![10, 20, 30, 40, 100],
        }
    }
}

/// Response for `getDailyRewardState`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRewardState {
    /// Days claimed in the current cycle; day N is unlocked at streak N-1
    pub streak: u32,
    /// Whether a claim right now would be accepted: not yet claimed today
    /// and the activity gate passes. The gate alone would still report true
    /// after today's claim.
    pub can_claim: bool,
    /// Whether today's reward has already been taken
    pub claimed_today: bool,
    /// Amount the next claim grants
    pub next_reward: i64,
}

/// Confirmed grant returned by `claimDailyReward`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimReceipt {
    pub reward_amount: i64,
    pub currency: Currency,
    /// Streak after this claim
    pub streak: u32,
    /// Authoritative balance read back after the grant
    pub balance: i64,
}

impl ClaimReceipt {
    pub fn message(&self) -> String {
        format!(
            "Congratulations! You received {} {}.",
            self.reward_amount,
            match self.currency {
                Currency::Tickets => "tickets",
                Currency::Points => "points",
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_wire_shape() {
        let json = r#"{"streak":2,"lastClaimed":"2024-03-01T10:00:00.000Z","lastBalance":140}"#;
        let state: PlayerRewardState = serde_json::from_str(json).unwrap();
        assert_eq!(state.streak, 2);
        assert_eq!(state.last_balance, Some(140));

        let legacy: PlayerRewardState =
            serde_json::from_str(r#"{"streak":1,"lastClaimed":null}"#).unwrap();
        assert_eq!(legacy.last_balance, None);
    }

    #[test]
    fn test_default_reward_table() {
        let config = RewardConfig::default();
        assert_eq!(config.cycle_len(), REWARD_COUNT);
        assert_eq!(config.reward_for(0), Some(10));
        assert_eq!(config.reward_for(4), Some(100));
        assert_eq!(config.reward_for(5), None);
        assert!(config.is_valid());
    }
}
