//! Store contracts implemented over SQLite

use super::{currency, events, players, referral_codes, settings, Database};
use async_trait::async_trait;
use chrono::Utc;
use loyalty_core::{
    AnalyticsEvent, Currency, CurrencyLedger, EventSink, LedgerEntry, LedgerMemo, LedgerQuery,
    PlayerId, PlayerStore, ReferralCode, ReferralDirectory, Result, SettingsStore, VersionedField,
};

#[async_trait]
impl PlayerStore for Database {
    async fn player_exists(&self, player: &PlayerId) -> Result<bool> {
        players::player_exists(self.pool(), player).await
    }

    async fn get_field(&self, player: &PlayerId, key: &str) -> Result<Option<VersionedField>> {
        players::get_field(self.pool(), player, key).await
    }

    async fn set_field(&self, player: &PlayerId, key: &str, value: &str) -> Result<()> {
        players::set_field(self.pool(), player, key, value).await
    }

    async fn compare_and_set_field(
        &self,
        player: &PlayerId,
        key: &str,
        value: &str,
        expected_version: Option<i64>,
    ) -> Result<bool> {
        players::compare_and_set_field(self.pool(), player, key, value, expected_version).await
    }

    async fn find_players_by_field(&self, key: &str, value: &str) -> Result<Vec<PlayerId>> {
        players::find_players_by_field(self.pool(), key, value).await
    }
}

#[async_trait]
impl CurrencyLedger for Database {
    async fn balance(&self, player: &PlayerId, currency: Currency) -> Result<i64> {
        currency::get_balance(self.pool(), player, currency).await
    }

    async fn add_currency(
        &self,
        player: &PlayerId,
        currency: Currency,
        amount: i64,
        memo: &LedgerMemo,
    ) -> Result<()> {
        currency::add_currency(self.pool(), player, currency, amount, memo).await?;
        Ok(())
    }

    async fn subtract_currency(
        &self,
        player: &PlayerId,
        currency: Currency,
        amount: i64,
        memo: &LedgerMemo,
    ) -> Result<()> {
        currency::subtract_currency(self.pool(), player, currency, amount, memo).await?;
        Ok(())
    }

    async fn ledger_entries(
        &self,
        player: &PlayerId,
        query: &LedgerQuery,
    ) -> Result<Vec<LedgerEntry>> {
        currency::list_ledger_entries(self.pool(), player, query).await
    }
}

#[async_trait]
impl ReferralDirectory for Database {
    async fn claim_code(&self, code: &ReferralCode, player: &PlayerId) -> Result<bool> {
        referral_codes::claim_referral_code(self.pool(), code, player).await
    }

    async fn resolve_code(&self, code: &ReferralCode) -> Result<Option<PlayerId>> {
        referral_codes::resolve_referral_code(self.pool(), code).await
    }
}

#[async_trait]
impl EventSink for Database {
    async fn emit(&self, event: &AnalyticsEvent) -> Result<()> {
        events::record_event(self.pool(), event, Utc::now()).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for Database {
    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        settings::get_setting(self.pool(), key).await
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        settings::put_setting(self.pool(), key, value).await
    }

    async fn replace_setting(&self, key: &str, expected: &str, value: &str) -> Result<bool> {
        settings::replace_setting(self.pool(), key, expected, value).await
    }
}
