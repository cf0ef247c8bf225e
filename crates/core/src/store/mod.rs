//! Contracts the loyalty services need from the external player store
//!
//! The services never assume a transaction spans two calls. Counters and
//! shared records are protected with [`PlayerStore::compare_and_set_field`]
//! or per-key records instead.

use crate::{
    AnalyticsEvent, Currency, LedgerEntry, LedgerMemo, LedgerQuery, PlayerId, ReferralCode, Result,
};
use async_trait::async_trait;

/// A stored string value plus its write version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedField {
    pub value: String,
    /// Starts at 1 and increases on every write
    pub version: i64,
}

/// Per-player key/value documents
#[async_trait]
pub trait PlayerStore: Send + Sync {
    async fn player_exists(&self, player: &PlayerId) -> Result<bool>;

    async fn get_field(&self, player: &PlayerId, key: &str) -> Result<Option<VersionedField>>;

    /// Unconditional overwrite (last writer wins)
    async fn set_field(&self, player: &PlayerId, key: &str, value: &str) -> Result<()>;

    /// Write only if the stored version still equals `expected_version`
    /// (`None` = the field must not exist yet). Returns whether it wrote.
    async fn compare_and_set_field(
        &self,
        player: &PlayerId,
        key: &str,
        value: &str,
        expected_version: Option<i64>,
    ) -> Result<bool>;

    /// Players whose `key` field equals `value`
    async fn find_players_by_field(&self, key: &str, value: &str) -> Result<Vec<PlayerId>>;
}

/// Authoritative virtual currency balances
#[async_trait]
pub trait CurrencyLedger: Send + Sync {
    async fn balance(&self, player: &PlayerId, currency: Currency) -> Result<i64>;

    /// Credit `amount` (> 0) atomically
    async fn add_currency(
        &self,
        player: &PlayerId,
        currency: Currency,
        amount: i64,
        memo: &LedgerMemo,
    ) -> Result<()>;

    /// Debit `amount` (> 0) atomically, failing with `InsufficientBalance`
    /// and leaving the balance untouched when it would go negative
    async fn subtract_currency(
        &self,
        player: &PlayerId,
        currency: Currency,
        amount: i64,
        memo: &LedgerMemo,
    ) -> Result<()>;

    async fn ledger_entries(&self, player: &PlayerId, query: &LedgerQuery)
        -> Result<Vec<LedgerEntry>>;
}

/// Unique index of referral codes, one record per code
#[async_trait]
pub trait ReferralDirectory: Send + Sync {
    /// Bind `code` to `player`. Returns false when the code is already taken.
    async fn claim_code(&self, code: &ReferralCode, player: &PlayerId) -> Result<bool>;

    async fn resolve_code(&self, code: &ReferralCode) -> Result<Option<PlayerId>>;
}

/// Analytics event sink
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: &AnalyticsEvent) -> Result<()>;
}

/// Title-wide JSON settings
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_setting(&self, key: &str) -> Result<Option<String>>;

    async fn put_setting(&self, key: &str, value: &str) -> Result<()>;

    /// Overwrite only while the stored value still equals `expected`.
    /// Returns whether it wrote.
    async fn replace_setting(&self, key: &str, expected: &str, value: &str) -> Result<bool>;
}

/// Everything the services talk to, behind one handle
pub trait Backend: PlayerStore + CurrencyLedger + ReferralDirectory + EventSink + SettingsStore {}

impl<T> Backend for T where
    T: PlayerStore + CurrencyLedger + ReferralDirectory + EventSink + SettingsStore
{
}
