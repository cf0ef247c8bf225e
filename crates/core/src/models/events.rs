//! Analytics events written to the event sink

use crate::{CommissionRate, Currency, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Best-effort analytics event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventName", content = "body", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    #[serde(rename_all = "camelCase")]
    PlayerClaimedDailyReward {
        player_id: PlayerId,
        streak: u32,
        reward: i64,
    },
    #[serde(rename_all = "camelCase")]
    ReferralCommissionGranted {
        referrer_id: PlayerId,
        referee_id: PlayerId,
        commission_amount: i64,
        original_amount: i64,
        commission_rate: CommissionRate,
    },
    #[serde(rename_all = "camelCase")]
    PlayerRegistered {
        player_id: PlayerId,
        referred_by: Option<PlayerId>,
    },
    #[serde(rename_all = "camelCase")]
    LuckyWheelSpun {
        player_id: PlayerId,
        currency: Currency,
        amount: i64,
    },
    #[serde(rename_all = "camelCase")]
    RaffleEntered {
        player_id: PlayerId,
        raffle_id: String,
        tickets_spent: i64,
    },
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AnalyticsEvent::PlayerClaimedDailyReward { .. } => "player_claimed_daily_reward",
            AnalyticsEvent::ReferralCommissionGranted { .. } => "referral_commission_granted",
            AnalyticsEvent::PlayerRegistered { .. } => "player_registered",
            AnalyticsEvent::LuckyWheelSpun { .. } => "lucky_wheel_spun",
            AnalyticsEvent::RaffleEntered { .. } => "raffle_entered",
        }
    }

    /// Player the event is filed under
    pub fn subject(&self) -> &PlayerId {
        match self {
            AnalyticsEvent::PlayerClaimedDailyReward { player_id, .. }
            | AnalyticsEvent::PlayerRegistered { player_id, .. }
            | AnalyticsEvent::LuckyWheelSpun { player_id, .. }
            | AnalyticsEvent::RaffleEntered { player_id, .. } => player_id,
            AnalyticsEvent::ReferralCommissionGranted { referrer_id, .. } => referrer_id,
        }
    }
}

/// Stored analytics event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: i64,
    pub event: AnalyticsEvent,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_envelope() {
        let event = AnalyticsEvent::PlayerClaimedDailyReward {
            player_id: PlayerId::parse("p1").unwrap(),
            streak: 3,
            reward: 30,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["eventName"], event.name());
        assert_eq!(value["body"]["streak"], 3);
        assert_eq!(value["body"]["playerId"], "p1");
    }
}
