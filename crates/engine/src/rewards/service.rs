//! Daily reward handlers: read the streak, claim today's reward

use super::streak::{claimed_on, effective_state, ActivityGate};
use crate::context::ServiceContext;
use loyalty_core::{
    AnalyticsEvent, ClaimReceipt, DailyRewardState, Error, LedgerMemo, LedgerReason, PlayerId,
    PlayerRewardState, Result, RewardConfig, REWARD_STATE_KEY,
};
use tracing::{debug, error, info, instrument, warn};

/// Stored streak plus the version it was read at (`None` = never written)
struct Loaded {
    state: PlayerRewardState,
    raw: Option<String>,
    version: Option<i64>,
}

/// Reward streak engine
#[derive(Clone)]
pub struct DailyRewards {
    ctx: ServiceContext,
    config: RewardConfig,
}

impl DailyRewards {
    pub fn new(ctx: ServiceContext, config: RewardConfig) -> Self {
        Self { ctx, config }
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Effective streak and whether a claim would be accepted right now.
    /// `can_claim` folds in `claimed_today`. Never writes.
    /// An unknown player is `PlayerNotFound`, a malformed id `InvalidArgument`.
    #[instrument(skip(self))]
    pub async fn get_state(&self, player_id: &str) -> Result<DailyRewardState> {
        let player = self.ctx.require_player(player_id).await?;
        let today = self.ctx.now().date_naive();

        let loaded = self.load(&player).await?;
        let effective = effective_state(&loaded.state, today, self.config.cycle_len());
        let claimed_today = claimed_on(&effective, today);
        let can_claim = !claimed_today && self.gate_permits(&player, &effective).await?;

        Ok(DailyRewardState {
            streak: effective.streak,
            can_claim,
            claimed_today,
            next_reward: self.config.reward_for(effective.streak).unwrap_or(0),
        })
    }

    /// Grant today's reward and advance the streak
    #[instrument(skip(self))]
    pub async fn claim(&self, player_id: &str) -> Result<ClaimReceipt> {
        let player = self.ctx.require_player(player_id).await?;
        let backend = self.ctx.backend();
        let max_attempts = self.ctx.config().max_write_retries.max(1);

        // Reserve the day first so two racing claims cannot both pay out
        let mut attempt = 0;
        let (prior, reserved_version, reserved, reward, now) = loop {
            attempt += 1;
            let now = self.ctx.now();
            let today = now.date_naive();

            let loaded = self.load(&player).await?;
            let effective = effective_state(&loaded.state, today, self.config.cycle_len());

            if claimed_on(&effective, today) {
                debug!(player = %player, "daily reward already claimed");
                return Err(Error::AlreadyClaimedToday);
            }
            let balance = self.balance(&player).await?;
            if !ActivityGate::for_state(&effective).permits(balance) {
                debug!(player = %player, streak = effective.streak, "no activity since last claim");
                return Err(Error::ActivityRequired);
            }

            let reward = self.config.reward_for(effective.streak).ok_or_else(|| {
                Error::InvalidData(format!("no reward configured for streak {}", effective.streak))
            })?;

            // Provisional balance keeps the gate closed if the final write never lands
            let reserved = PlayerRewardState {
                streak: effective.streak + 1,
                last_claimed: Some(now),
                last_balance: Some(balance.saturating_add(reward)),
            };
            let json = serde_json::to_string(&reserved)?;
            let won = self
                .ctx
                .bounded(
                    "compare_and_set_field",
                    backend.compare_and_set_field(&player, REWARD_STATE_KEY, &json, loaded.version),
                )
                .await?;

            if won {
                let reserved_version = loaded.version.map_or(1, |v| v + 1);
                break (loaded.raw, reserved_version, reserved, reward, now);
            }
            if attempt >= max_attempts {
                warn!(player = %player, attempt, "gave up reserving daily reward");
                return Err(Error::Conflict(format!(
                    "reward state for {} kept changing",
                    player
                )));
            }
            debug!(player = %player, attempt, "reward state changed underneath us, re-reading");
        };

        let currency = self.config.currency;
        let new_streak = reserved.streak;
        let memo = LedgerMemo::new(LedgerReason::DailyReward, now)
            .with_reference(format!("day-{}", new_streak));

        match self
            .ctx
            .bounded(
                "add_currency",
                backend.add_currency(&player, currency, reward, &memo),
            )
            .await
        {
            Ok(()) => {}
            Err(Error::Timeout(op)) => {
                // The grant may still land; keep the reservation so it cannot pay twice
                error!(
                    marker = "reward_grant_outcome_unknown",
                    player = %player,
                    reward,
                    "daily reward grant timed out"
                );
                return Err(Error::Timeout(op));
            }
            Err(e) => {
                self.release(&player, prior, reserved_version).await;
                return Err(e);
            }
        }

        let balance = match self.finish(&player, reserved).await {
            Ok(balance) => balance,
            Err(e) => {
                error!(
                    marker = "reward_granted_state_unsaved",
                    player = %player,
                    reward,
                    error = %e,
                    "daily reward granted but streak state not saved"
                );
                return Err(e);
            }
        };

        info!(player = %player, streak = new_streak, reward, balance, "daily reward claimed");

        self.ctx
            .emit(AnalyticsEvent::PlayerClaimedDailyReward {
                player_id: player,
                streak: new_streak,
                reward,
            })
            .await;

        Ok(ClaimReceipt {
            reward_amount: reward,
            currency,
            streak: new_streak,
            balance,
        })
    }

    async fn load(&self, player: &PlayerId) -> Result<Loaded> {
        let field = self
            .ctx
            .bounded(
                "get_field",
                self.ctx.backend().get_field(player, REWARD_STATE_KEY),
            )
            .await?;

        let Some(field) = field else {
            return Ok(Loaded {
                state: PlayerRewardState::default(),
                raw: None,
                version: None,
            });
        };

        let state = match serde_json::from_str::<PlayerRewardState>(&field.value) {
            Ok(state) => state,
            Err(e) => {
                warn!(player = %player, error = %e, "unreadable reward state, starting fresh");
                PlayerRewardState::default()
            }
        };

        Ok(Loaded {
            state,
            raw: Some(field.value),
            version: Some(field.version),
        })
    }

    async fn gate_permits(&self, player: &PlayerId, effective: &PlayerRewardState) -> Result<bool> {
        match ActivityGate::for_state(effective) {
            ActivityGate::Open => Ok(true),
            gate => Ok(gate.permits(self.balance(player).await?)),
        }
    }

    async fn balance(&self, player: &PlayerId) -> Result<i64> {
        self.ctx
            .bounded(
                "balance",
                self.ctx.backend().balance(player, self.config.currency),
            )
            .await
    }

    /// Record the authoritative balance next to the advanced streak
    async fn finish(
        &self,
        player: &PlayerId,
        mut state: PlayerRewardState,
    ) -> Result<i64> {
        let backend = self.ctx.backend();
        let balance = self.balance(player).await?;

        state.last_balance = Some(balance);
        let json = serde_json::to_string(&state)?;
        self.ctx
            .bounded("set_field", backend.set_field(player, REWARD_STATE_KEY, &json))
            .await?;

        Ok(balance)
    }

    /// Undo a reservation after the grant failed
    async fn release(&self, player: &PlayerId, prior: Option<String>, reserved_version: i64) {
        let value = match prior {
            Some(raw) => raw,
            None => match serde_json::to_string(&PlayerRewardState::default()) {
                Ok(json) => json,
                Err(e) => {
                    error!(player = %player, error = %e, "could not encode empty reward state");
                    return;
                }
            },
        };

        let restored = self
            .ctx
            .bounded(
                "compare_and_set_field",
                self.ctx.backend().compare_and_set_field(
                    player,
                    REWARD_STATE_KEY,
                    &value,
                    Some(reserved_version),
                ),
            )
            .await;

        match restored {
            Ok(true) => debug!(player = %player, "released daily reward reservation"),
            Ok(false) => warn!(player = %player, "reward state moved on, reservation not released"),
            Err(e) => error!(
                marker = "reward_reservation_stuck",
                player = %player,
                error = %e,
                "could not release daily reward reservation"
            ),
        }
    }
}
