//! Referral registration, commission payout and stats

use super::codes::generate_code;
use super::counter::{increment_counter, parse_counter};
use super::stats::{commission_by_referee, earnings_breakdown};
use crate::context::ServiceContext;
use loyalty_core::{
    commission_rate, AnalyticsEvent, CommissionGrant, Currency, Error, LedgerMemo, LedgerQuery,
    LedgerReason, PlayerId, ReferralCode, ReferralProfile, ReferralStats, ReferredUser,
    RegistrationOutcome, Result, NO_REFERRER, REFERRAL_CODE_KEY, REFERRED_BY_KEY,
    TOTAL_REFERRALS_KEY,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, instrument, warn};

/// Stats placeholder for players without a code
const NO_CODE: &str = "N/A";

/// Referral commission ledger
#[derive(Clone)]
pub struct ReferralLedger {
    ctx: ServiceContext,
}

impl ReferralLedger {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Post-registration setup: hand out a personal code and link the
    /// referrer when a valid code was supplied
    pub async fn register(
        &self,
        player_id: &str,
        referral_code: Option<&str>,
    ) -> Result<RegistrationOutcome> {
        let mut rng = StdRng::from_entropy();
        self.register_with_rng(player_id, referral_code, &mut rng)
            .await
    }

    #[instrument(skip(self, rng))]
    pub async fn register_with_rng<R: Rng + Send>(
        &self,
        player_id: &str,
        referral_code: Option<&str>,
        rng: &mut R,
    ) -> Result<RegistrationOutcome> {
        let player = self.ctx.require_player(player_id).await?;
        let backend = self.ctx.backend();

        if let Some(existing) = self.own_code(&player).await? {
            debug!(player = %player, code = %existing, "player already registered for referrals");
            let referred_by = self.referrer_of(&player).await?;
            return Ok(RegistrationOutcome {
                personal_referral_code: existing,
                referred_by,
            });
        }

        let code = self.claim_fresh_code(&player, rng).await?;

        let referrer = match referral_code {
            Some(raw) if !raw.trim().is_empty() => self.lookup_referrer(&player, raw).await,
            _ => None,
        };

        // referredBy is written at most once; only the writer that sets it
        // bumps the referrer's counter
        let referred_by_value = referrer.as_ref().map_or(NO_REFERRER, |r| r.as_str());
        let linked_now = self
            .ctx
            .bounded(
                "compare_and_set_field",
                backend.compare_and_set_field(&player, REFERRED_BY_KEY, referred_by_value, None),
            )
            .await?;

        let referred_by = if linked_now {
            if let Some(referrer) = &referrer {
                self.count_referral(referrer, &player).await;
            }
            referrer
        } else {
            self.referrer_of(&player).await?
        };

        self.ctx
            .bounded(
                "compare_and_set_field",
                backend.compare_and_set_field(&player, TOTAL_REFERRALS_KEY, "0", None),
            )
            .await?;
        let stored = self
            .ctx
            .bounded(
                "compare_and_set_field",
                backend.compare_and_set_field(&player, REFERRAL_CODE_KEY, code.as_str(), None),
            )
            .await?;
        if !stored {
            // A concurrent registration for the same player finished first
            if let Some(existing) = self.own_code(&player).await? {
                debug!(player = %player, code = %existing, "registration raced, keeping stored code");
                return Ok(RegistrationOutcome {
                    personal_referral_code: existing,
                    referred_by,
                });
            }
            return Err(Error::Conflict(format!(
                "referral code for {} is unreadable",
                player
            )));
        }

        info!(
            player = %player,
            code = %code,
            referred_by = referred_by.as_ref().map(|r| r.as_str()).unwrap_or(NO_REFERRER),
            "referral profile created"
        );
        self.ctx
            .emit(AnalyticsEvent::PlayerRegistered {
                player_id: player,
                referred_by: referred_by.clone(),
            })
            .await;

        Ok(RegistrationOutcome {
            personal_referral_code: code,
            referred_by,
        })
    }

    /// Referral fields as stored
    pub async fn profile(&self, player_id: &str) -> Result<ReferralProfile> {
        let player = self.ctx.require_player(player_id).await?;
        Ok(ReferralProfile {
            referral_code: self.own_code(&player).await?,
            referred_by: self.referrer_of(&player).await?,
            total_referrals: self.total_referrals(&player).await?,
        })
    }

    /// Pay the referee's referrer their cut of `amount_earned`.
    ///
    /// Best-effort: failures are logged and reported as no grant so the
    /// caller's own reward is never affected.
    #[instrument(skip(self))]
    pub async fn distribute_commission(
        &self,
        referee_id: &str,
        amount_earned: i64,
    ) -> Option<CommissionGrant> {
        match self.try_distribute(referee_id, amount_earned).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!(referee = referee_id, amount_earned, error = %e, "referral commission not distributed");
                None
            }
        }
    }

    async fn try_distribute(
        &self,
        referee_id: &str,
        amount_earned: i64,
    ) -> Result<Option<CommissionGrant>> {
        if amount_earned <= 0 {
            return Ok(None);
        }
        let referee = PlayerId::parse(referee_id)?;
        let Some(referrer) = self.referrer_of(&referee).await? else {
            return Ok(None);
        };

        let total = self.total_referrals(&referrer).await?;
        let rate = commission_rate(total);
        if rate.is_zero() {
            debug!(referrer = %referrer, total, "referrer below first commission tier");
            return Ok(None);
        }

        let commission = rate.apply(amount_earned);
        if commission <= 0 {
            return Ok(None);
        }

        let memo = LedgerMemo::new(LedgerReason::ReferralCommission, self.ctx.now())
            .with_reference(referee.as_str());
        self.ctx
            .bounded(
                "add_currency",
                self.ctx
                    .backend()
                    .add_currency(&referrer, Currency::Tickets, commission, &memo),
            )
            .await?;

        info!(
            referrer = %referrer,
            referee = %referee,
            commission,
            rate = rate.as_f64(),
            "referral commission granted"
        );

        let grant = CommissionGrant {
            referrer_id: referrer,
            referee_id: referee,
            commission,
            original_amount: amount_earned,
            rate,
        };
        self.ctx
            .emit(AnalyticsEvent::ReferralCommissionGranted {
                referrer_id: grant.referrer_id.clone(),
                referee_id: grant.referee_id.clone(),
                commission_amount: commission,
                original_amount: amount_earned,
                commission_rate: rate,
            })
            .await;

        Ok(Some(grant))
    }

    #[instrument(skip(self))]
    pub async fn stats(&self, player_id: &str) -> Result<ReferralStats> {
        let player = self.ctx.require_player(player_id).await?;
        let backend = self.ctx.backend();

        let referral_code = self
            .own_code(&player)
            .await?
            .map_or_else(|| NO_CODE.to_string(), |c| c.to_string());
        let total_referrals = self.total_referrals(&player).await?;

        let commissions = self
            .ctx
            .bounded(
                "ledger_entries",
                backend.ledger_entries(&player, &LedgerQuery::reason(LedgerReason::ReferralCommission)),
            )
            .await?;
        let earnings = earnings_breakdown(&commissions, self.ctx.now());
        let per_referee = commission_by_referee(&commissions);

        let referred = self
            .ctx
            .bounded(
                "find_players_by_field",
                backend.find_players_by_field(REFERRED_BY_KEY, player.as_str()),
            )
            .await?;
        let referred_users = referred
            .into_iter()
            .map(|referee| ReferredUser {
                commission_earned: per_referee.get(referee.as_str()).copied().unwrap_or(0),
                player_id: referee,
            })
            .collect();

        Ok(ReferralStats {
            referral_code,
            total_referrals,
            earnings,
            referred_users,
        })
    }

    async fn claim_fresh_code<R: Rng + Send>(
        &self,
        player: &PlayerId,
        rng: &mut R,
    ) -> Result<ReferralCode> {
        let attempts = self.ctx.config().code_attempts.max(1);
        for attempt in 1..=attempts {
            let code = generate_code(rng)?;
            let claimed = self
                .ctx
                .bounded(
                    "claim_code",
                    self.ctx.backend().claim_code(&code, player),
                )
                .await?;
            if claimed {
                return Ok(code);
            }
            debug!(player = %player, code = %code, attempt, "referral code collision");
        }
        Err(Error::Conflict(format!(
            "no free referral code after {} attempts",
            attempts
        )))
    }

    /// Resolve a supplied code to a referrer. Never fails the registration.
    async fn lookup_referrer(&self, player: &PlayerId, raw: &str) -> Option<PlayerId> {
        let code = match ReferralCode::parse(raw) {
            Ok(code) => code,
            Err(_) => {
                info!(marker = "referral_code_not_found", player = %player, code = raw, "malformed referral code");
                return None;
            }
        };

        match self
            .ctx
            .bounded("resolve_code", self.ctx.backend().resolve_code(&code))
            .await
        {
            Ok(Some(referrer)) if &referrer == player => {
                info!(player = %player, code = %code, "ignoring self-referral");
                None
            }
            Ok(Some(referrer)) => Some(referrer),
            Ok(None) => {
                info!(marker = "referral_code_not_found", player = %player, code = %code, "unknown referral code");
                None
            }
            Err(e) => {
                warn!(player = %player, code = %code, error = %e, "referral code lookup failed");
                None
            }
        }
    }

    async fn count_referral(&self, referrer: &PlayerId, referee: &PlayerId) {
        match increment_counter(&self.ctx, referrer, TOTAL_REFERRALS_KEY).await {
            Ok(total) => info!(referrer = %referrer, referee = %referee, total, "referral linked"),
            Err(e) => error!(
                marker = "referral_count_unsaved",
                referrer = %referrer,
                referee = %referee,
                error = %e,
                "referral linked but counter not incremented"
            ),
        }
    }

    async fn own_code(&self, player: &PlayerId) -> Result<Option<ReferralCode>> {
        let field = self
            .ctx
            .bounded(
                "get_field",
                self.ctx.backend().get_field(player, REFERRAL_CODE_KEY),
            )
            .await?;
        Ok(field.and_then(|f| ReferralCode::parse(&f.value).ok()))
    }

    async fn referrer_of(&self, player: &PlayerId) -> Result<Option<PlayerId>> {
        let field = self
            .ctx
            .bounded(
                "get_field",
                self.ctx.backend().get_field(player, REFERRED_BY_KEY),
            )
            .await?;
        Ok(field
            .filter(|f| f.value != NO_REFERRER)
            .and_then(|f| PlayerId::parse(&f.value).ok()))
    }

    async fn total_referrals(&self, player: &PlayerId) -> Result<u64> {
        let field = self
            .ctx
            .bounded(
                "get_field",
                self.ctx.backend().get_field(player, TOTAL_REFERRALS_KEY),
            )
            .await?;
        Ok(parse_counter(field.as_ref()))
    }
}
