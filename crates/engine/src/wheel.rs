//! Lucky wheel: pay a ticket, win a weighted prize

use crate::context::ServiceContext;
use crate::referral::ReferralLedger;
use loyalty_core::{
    AnalyticsEvent, Currency, Error, LedgerMemo, LedgerReason, Result, SpinOutcome, WheelConfig,
    WheelPrize,
};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, instrument};

#[derive(Clone)]
pub struct LuckyWheel {
    ctx: ServiceContext,
    config: WheelConfig,
    referrals: ReferralLedger,
}

impl LuckyWheel {
    pub fn new(ctx: ServiceContext, config: WheelConfig, referrals: ReferralLedger) -> Self {
        Self {
            ctx,
            config,
            referrals,
        }
    }

    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    /// Weighted draw over the prize table
    pub fn pick_prize<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&WheelPrize> {
        let weights = WeightedIndex::new(self.config.prizes.iter().map(|p| p.weight))
            .map_err(|e| Error::InvalidData(format!("wheel prize table unusable: {}", e)))?;
        Ok(&self.config.prizes[weights.sample(rng)])
    }

    pub async fn spin(&self, player_id: &str) -> Result<SpinOutcome> {
        let mut rng = StdRng::from_entropy();
        self.spin_with(player_id, &mut rng).await
    }

    #[instrument(skip(self, rng))]
    pub async fn spin_with<R: Rng + Send>(
        &self,
        player_id: &str,
        rng: &mut R,
    ) -> Result<SpinOutcome> {
        let player = self.ctx.require_player(player_id).await?;
        let backend = self.ctx.backend();
        let prize = self.pick_prize(rng)?.clone();
        let now = self.ctx.now();

        let cost = LedgerMemo::new(LedgerReason::WheelSpinCost, now);
        if let Err(e) = self
            .ctx
            .bounded(
                "subtract_currency",
                backend.subtract_currency(&player, Currency::Tickets, self.config.spin_cost, &cost),
            )
            .await
        {
            debug!(player = %player, error = %e, "spin not paid for");
            return Err(e);
        }

        let win = LedgerMemo::new(LedgerReason::WheelPrize, now);
        if let Err(e) = self
            .ctx
            .bounded(
                "add_currency",
                backend.add_currency(&player, prize.currency, prize.amount, &win),
            )
            .await
        {
            error!(
                marker = "wheel_prize_unpaid",
                player = %player,
                currency = %prize.currency,
                amount = prize.amount,
                error = %e,
                "spin paid for but prize not credited"
            );
            return Err(e);
        }

        let commission = match prize.currency {
            Currency::Tickets => {
                self.referrals
                    .distribute_commission(player.as_str(), prize.amount)
                    .await
            }
            Currency::Points => None,
        };

        let balance = self
            .ctx
            .bounded("balance", backend.balance(&player, prize.currency))
            .await?;

        info!(player = %player, currency = %prize.currency, amount = prize.amount, "wheel spun");
        self.ctx
            .emit(AnalyticsEvent::LuckyWheelSpun {
                player_id: player,
                currency: prize.currency,
                amount: prize.amount,
            })
            .await;

        Ok(SpinOutcome {
            prize,
            balance,
            commission,
        })
    }
}
