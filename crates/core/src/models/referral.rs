//! Referral program models

use crate::{CommissionRate, PlayerId, ReferralCode};
use serde::{Deserialize, Serialize};

/// Player data key holding the player's own code
pub const REFERRAL_CODE_KEY: &str = "referralCode";
/// Player data key holding the referrer's id (or [`NO_REFERRER`])
pub const REFERRED_BY_KEY: &str = "referredBy";
/// Player data key holding the downstream referral counter
pub const TOTAL_REFERRALS_KEY: &str = "totalReferrals";
/// Stored `referredBy` value for players nobody referred
pub const NO_REFERRER: &str = "None";

/// Commission breakpoints, highest first: (minimum referrals, rate)
pub const COMMISSION_TIERS: [(u64, f64); 6] = [
    (100, 0.15),
    (50, 0.10),
    (25, 0.07),
    (10, 0.05),
    (5, 0.02),
    (2, 0.01),
];

/// Rate paid to a referrer who has `total_referrals` linked players
pub fn commission_rate(total_referrals: u64) -> CommissionRate {
    COMMISSION_TIERS
        .iter()
        .find(|(min, _)| total_referrals >= *min)
        .map(|(_, rate)| CommissionRate(*rate))
        .unwrap_or(CommissionRate::ZERO)
}

/// Referral fields of one player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralProfile {
    pub referral_code: Option<ReferralCode>,
    pub referred_by: Option<PlayerId>,
    pub total_referrals: u64,
}

/// Result of `postRegistrationSetup`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOutcome {
    pub personal_referral_code: ReferralCode,
    /// Referrer the player was linked to, if any
    pub referred_by: Option<PlayerId>,
}

/// A commission credited to a referrer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionGrant {
    pub referrer_id: PlayerId,
    pub referee_id: PlayerId,
    pub commission: i64,
    pub original_amount: i64,
    pub rate: CommissionRate,
}

/// Commission earnings bucketed by period (UTC)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsBreakdown {
    pub today: i64,
    pub this_week: i64,
    pub this_month: i64,
    pub all_time: i64,
}

/// A player this player referred
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferredUser {
    pub player_id: PlayerId,
    /// Commission this referee has generated so far
    pub commission_earned: i64,
}

/// Response for `getReferralStats`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralStats {
    /// Own code, or `N/A` before registration setup ran
    pub referral_code: String,
    pub total_referrals: u64,
    pub earnings: EarningsBreakdown,
    pub referred_users: Vec<ReferredUser>,
}
