//! Player-facing currency transaction history

use crate::context::ServiceContext;
use loyalty_core::{LedgerEntry, LedgerQuery, Result};

/// Entries returned when the caller does not ask for a count
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
/// Hard cap on one page of history
pub const MAX_HISTORY_LIMIT: u32 = 200;

#[derive(Clone)]
pub struct TransactionHistory {
    ctx: ServiceContext,
}

impl TransactionHistory {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Newest-first ledger entries for a player
    pub async fn transactions(&self, player_id: &str, limit: Option<u32>) -> Result<Vec<LedgerEntry>> {
        let player = self.ctx.require_player(player_id).await?;
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);

        self.ctx
            .bounded(
                "ledger_entries",
                self.ctx
                    .backend()
                    .ledger_entries(&player, &LedgerQuery::latest(limit)),
            )
            .await
    }
}
