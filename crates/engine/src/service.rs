//! One handle over every loyalty service, shared by request handlers

use crate::clock::Clock;
use crate::config::{EngineConfig, GameConfig};
use crate::context::ServiceContext;
use crate::history::TransactionHistory;
use crate::raffle::Raffles;
use crate::referral::ReferralLedger;
use crate::rewards::DailyRewards;
use crate::wheel::LuckyWheel;
use loyalty_core::{
    Backend, ClaimReceipt, CommissionGrant, DailyRewardState, ReferralStats, RegistrationOutcome,
    Result,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct LoyaltyService {
    rewards: DailyRewards,
    referrals: ReferralLedger,
    wheel: LuckyWheel,
    raffles: Raffles,
    history: TransactionHistory,
}

impl LoyaltyService {
    pub fn new(
        backend: Arc<dyn Backend>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
        game: GameConfig,
    ) -> Self {
        let ctx = ServiceContext::new(backend, clock, config);
        let referrals = ReferralLedger::new(ctx.clone());
        Self {
            rewards: DailyRewards::new(ctx.clone(), game.rewards),
            wheel: LuckyWheel::new(ctx.clone(), game.wheel, referrals.clone()),
            raffles: Raffles::new(ctx.clone()),
            history: TransactionHistory::new(ctx),
            referrals,
        }
    }

    pub fn rewards(&self) -> &DailyRewards {
        &self.rewards
    }

    pub fn referrals(&self) -> &ReferralLedger {
        &self.referrals
    }

    pub fn wheel(&self) -> &LuckyWheel {
        &self.wheel
    }

    pub fn raffles(&self) -> &Raffles {
        &self.raffles
    }

    pub fn history(&self) -> &TransactionHistory {
        &self.history
    }

    // Logical handler names exposed to the API layer

    pub async fn get_daily_reward_state(&self, player_id: &str) -> Result<DailyRewardState> {
        self.rewards.get_state(player_id).await
    }

    pub async fn claim_daily_reward(&self, player_id: &str) -> Result<ClaimReceipt> {
        self.rewards.claim(player_id).await
    }

    pub async fn post_registration_setup(
        &self,
        player_id: &str,
        referral_code: Option<&str>,
    ) -> Result<RegistrationOutcome> {
        self.referrals.register(player_id, referral_code).await
    }

    pub async fn get_referral_stats(&self, player_id: &str) -> Result<ReferralStats> {
        self.referrals.stats(player_id).await
    }

    pub async fn distribute_referral_commission(
        &self,
        referee_id: &str,
        amount_earned: i64,
    ) -> Option<CommissionGrant> {
        self.referrals
            .distribute_commission(referee_id, amount_earned)
            .await
    }
}
