//! The current raffle and paid entries into it

use crate::context::ServiceContext;
use loyalty_core::{
    AnalyticsEvent, Error, LedgerMemo, LedgerReason, Raffle, RaffleEntryReceipt, RaffleView,
    Result, CURRENT_RAFFLE_KEY,
};
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct Raffles {
    ctx: ServiceContext,
}

impl Raffles {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Replace the current raffle
    #[instrument(skip(self, raffle), fields(raffle = %raffle.id))]
    pub async fn open(&self, raffle: Raffle) -> Result<RaffleView> {
        if raffle.id.trim().is_empty() || raffle.title.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "raffle id and title are required".to_string(),
            ));
        }
        if raffle.ticket_cost <= 0 {
            return Err(Error::InvalidArgument(
                "raffle ticket cost must be positive".to_string(),
            ));
        }

        self.store(&raffle).await?;
        info!(title = %raffle.title, ends_at = %raffle.ends_at, "raffle opened");
        Ok(self.view(raffle))
    }

    pub async fn current(&self) -> Result<Option<RaffleView>> {
        Ok(self.load().await?.map(|raffle| self.view(raffle)))
    }

    /// Close the raffle to new entries ahead of its end time.
    /// Only closes the raffle it read, so a raffle opened meanwhile survives.
    #[instrument(skip(self))]
    pub async fn end(&self, raffle_id: &str) -> Result<RaffleView> {
        let max_attempts = self.ctx.config().max_write_retries.max(1);

        for attempt in 1..=max_attempts {
            let (raw, mut raffle) = match self.load_raw().await? {
                Some((raw, raffle)) if raffle.id == raffle_id.trim() => (raw, raffle),
                _ => return Err(Error::RaffleNotFound(raffle_id.to_string())),
            };
            if raffle.closed {
                return Ok(self.view(raffle));
            }

            raffle.closed = true;
            let json = serde_json::to_string(&raffle)?;
            let written = self
                .ctx
                .bounded(
                    "replace_setting",
                    self.ctx
                        .backend()
                        .replace_setting(CURRENT_RAFFLE_KEY, &raw, &json),
                )
                .await?;
            if written {
                info!("raffle ended");
                return Ok(self.view(raffle));
            }
            debug!(attempt, "current raffle changed underneath us, re-reading");
        }

        warn!("gave up ending raffle");
        Err(Error::Conflict(format!("raffle {} kept changing", raffle_id)))
    }

    /// Pay the ticket cost and enter the player
    #[instrument(skip(self))]
    pub async fn enter(&self, player_id: &str, raffle_id: &str) -> Result<RaffleEntryReceipt> {
        let player = self.ctx.require_player(player_id).await?;
        let raffle = self.find(raffle_id).await?;
        let now = self.ctx.now();

        if raffle.has_ended(now) {
            debug!(player = %player, "raffle already ended");
            return Err(Error::RaffleEnded(raffle.id));
        }

        let backend = self.ctx.backend();
        let memo = LedgerMemo::new(LedgerReason::RaffleEntry, now).with_reference(raffle.id.as_str());
        self.ctx
            .bounded(
                "subtract_currency",
                backend.subtract_currency(&player, raffle.currency, raffle.ticket_cost, &memo),
            )
            .await?;
        let balance = self
            .ctx
            .bounded("balance", backend.balance(&player, raffle.currency))
            .await?;

        info!(player = %player, cost = raffle.ticket_cost, balance, "raffle entered");
        self.ctx
            .emit(AnalyticsEvent::RaffleEntered {
                player_id: player,
                raffle_id: raffle.id.clone(),
                tickets_spent: raffle.ticket_cost,
            })
            .await;

        Ok(RaffleEntryReceipt {
            raffle_id: raffle.id,
            tickets_spent: raffle.ticket_cost,
            balance,
        })
    }

    fn view(&self, raffle: Raffle) -> RaffleView {
        let ended = raffle.has_ended(self.ctx.now());
        RaffleView { raffle, ended }
    }

    async fn find(&self, raffle_id: &str) -> Result<Raffle> {
        match self.load().await? {
            Some(raffle) if raffle.id == raffle_id.trim() => Ok(raffle),
            _ => Err(Error::RaffleNotFound(raffle_id.to_string())),
        }
    }

    async fn load(&self) -> Result<Option<Raffle>> {
        Ok(self.load_raw().await?.map(|(_, raffle)| raffle))
    }

    /// Current raffle plus the stored JSON it was decoded from
    async fn load_raw(&self) -> Result<Option<(String, Raffle)>> {
        let raw = self
            .ctx
            .bounded(
                "get_setting",
                self.ctx.backend().get_setting(CURRENT_RAFFLE_KEY),
            )
            .await?;
        match raw {
            Some(raw) => {
                let raffle = serde_json::from_str(&raw)?;
                Ok(Some((raw, raffle)))
            }
            None => Ok(None),
        }
    }

    async fn store(&self, raffle: &Raffle) -> Result<()> {
        let json = serde_json::to_string(raffle)?;
        self.ctx
            .bounded(
                "put_setting",
                self.ctx.backend().put_setting(CURRENT_RAFFLE_KEY, &json),
            )
            .await
    }
}
