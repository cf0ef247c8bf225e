//! In-memory backend for service tests
//!
//! Supports injected failures and hangs per operation, and can yield to the
//! scheduler before every call so that concurrent requests interleave.

use async_trait::async_trait;
use chrono::Utc;
use loyalty_core::{
    AnalyticsEvent, Currency, CurrencyLedger, Error, EventSink, LedgerEntry, LedgerMemo,
    LedgerQuery, PlayerId, PlayerStore, ReferralCode, ReferralDirectory, Result, SettingsStore,
    VersionedField,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    players: HashSet<PlayerId>,
    fields: HashMap<(PlayerId, String), VersionedField>,
    balances: HashMap<(PlayerId, Currency), i64>,
    ledger: Vec<LedgerEntry>,
    codes: HashMap<ReferralCode, PlayerId>,
    events: Vec<AnalyticsEvent>,
    settings: HashMap<String, String>,
    calls: HashMap<&'static str, usize>,
}

#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
    failing: Mutex<HashSet<&'static str>>,
    hanging: Mutex<HashSet<&'static str>>,
    interleave: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yield before every call so `join!`-ed requests interleave
    pub fn interleaved() -> Self {
        let backend = Self::default();
        backend.interleave.store(true, Ordering::SeqCst);
        backend
    }

    pub fn add_player(&self, raw: &str) -> PlayerId {
        let player = PlayerId::parse(raw).unwrap();
        self.state.lock().unwrap().players.insert(player.clone());
        player
    }

    pub fn set_balance(&self, player: &PlayerId, currency: Currency, amount: i64) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert((player.clone(), currency), amount);
    }

    pub fn balance_of(&self, player: &PlayerId, currency: Currency) -> i64 {
        let state = self.state.lock().unwrap();
        state
            .balances
            .get(&(player.clone(), currency))
            .copied()
            .unwrap_or(0)
    }

    pub fn field(&self, player: &PlayerId, key: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .fields
            .get(&(player.clone(), key.to_string()))
            .map(|f| f.value.clone())
    }

    pub fn put_field(&self, player: &PlayerId, key: &str, value: &str) {
        let mut state = self.state.lock().unwrap();
        let slot = (player.clone(), key.to_string());
        let version = state.fields.get(&slot).map_or(1, |f| f.version + 1);
        state.fields.insert(
            slot,
            VersionedField {
                value: value.to_string(),
                version,
            },
        );
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn calls(&self, op: &str) -> usize {
        self.state.lock().unwrap().calls.get(op).copied().unwrap_or(0)
    }

    /// Make `op` return a database error until cleared
    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    /// Make `op` never complete
    pub fn hang(&self, op: &'static str) {
        self.hanging.lock().unwrap().insert(op);
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
        self.hanging.lock().unwrap().clear();
    }

    async fn enter(&self, op: &'static str) -> Result<()> {
        if self.interleave.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        *self.state.lock().unwrap().calls.entry(op).or_insert(0) += 1;

        if self.hanging.lock().unwrap().contains(op) {
            std::future::pending::<()>().await;
        }
        if self.failing.lock().unwrap().contains(op) {
            return Err(Error::DatabaseError(format!("injected failure in {}", op)));
        }
        Ok(())
    }

    fn record(
        state: &mut State,
        player: &PlayerId,
        currency: Currency,
        delta: i64,
        balance_after: i64,
        memo: &LedgerMemo,
    ) {
        let id = state.ledger.len() as i64 + 1;
        state.ledger.push(LedgerEntry {
            id,
            player_id: player.clone(),
            currency,
            delta,
            balance_after,
            reason: memo.reason,
            reference: memo.reference.clone(),
            created_at: memo.at,
        });
    }
}

#[async_trait]
impl PlayerStore for MemoryBackend {
    async fn player_exists(&self, player: &PlayerId) -> Result<bool> {
        self.enter("player_exists").await?;
        Ok(self.state.lock().unwrap().players.contains(player))
    }

    async fn get_field(&self, player: &PlayerId, key: &str) -> Result<Option<VersionedField>> {
        self.enter("get_field").await?;
        let state = self.state.lock().unwrap();
        Ok(state.fields.get(&(player.clone(), key.to_string())).cloned())
    }

    async fn set_field(&self, player: &PlayerId, key: &str, value: &str) -> Result<()> {
        self.enter("set_field").await?;
        self.put_field(player, key, value);
        Ok(())
    }

    async fn compare_and_set_field(
        &self,
        player: &PlayerId,
        key: &str,
        value: &str,
        expected_version: Option<i64>,
    ) -> Result<bool> {
        self.enter("compare_and_set_field").await?;
        let mut state = self.state.lock().unwrap();
        let slot = (player.clone(), key.to_string());
        let current = state.fields.get(&slot).map(|f| f.version);
        if current != expected_version {
            return Ok(false);
        }
        state.fields.insert(
            slot,
            VersionedField {
                value: value.to_string(),
                version: current.map_or(1, |v| v + 1),
            },
        );
        Ok(true)
    }

    async fn find_players_by_field(&self, key: &str, value: &str) -> Result<Vec<PlayerId>> {
        self.enter("find_players_by_field").await?;
        let state = self.state.lock().unwrap();
        let mut found: Vec<PlayerId> = state
            .fields
            .iter()
            .filter(|((_, k), f)| k == key && f.value == value)
            .map(|((p, _), _)| p.clone())
            .collect();
        found.sort();
        Ok(found)
    }
}

#[async_trait]
impl CurrencyLedger for MemoryBackend {
    async fn balance(&self, player: &PlayerId, currency: Currency) -> Result<i64> {
        self.enter("balance").await?;
        Ok(self.balance_of(player, currency))
    }

    async fn add_currency(
        &self,
        player: &PlayerId,
        currency: Currency,
        amount: i64,
        memo: &LedgerMemo,
    ) -> Result<()> {
        self.enter("add_currency").await?;
        if amount <= 0 {
            return Err(Error::InvalidArgument("amount must be positive".into()));
        }
        let mut state = self.state.lock().unwrap();
        let balance = state.balances.entry((player.clone(), currency)).or_insert(0);
        *balance += amount;
        let after = *balance;
        Self::record(&mut state, player, currency, amount, after, memo);
        Ok(())
    }

    async fn subtract_currency(
        &self,
        player: &PlayerId,
        currency: Currency,
        amount: i64,
        memo: &LedgerMemo,
    ) -> Result<()> {
        self.enter("subtract_currency").await?;
        if amount <= 0 {
            return Err(Error::InvalidArgument("amount must be positive".into()));
        }
        let mut state = self.state.lock().unwrap();
        let balance = state.balances.entry((player.clone(), currency)).or_insert(0);
        if *balance < amount {
            return Err(Error::InsufficientBalance {
                required: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        let after = *balance;
        Self::record(&mut state, player, currency, -amount, after, memo);
        Ok(())
    }

    async fn ledger_entries(
        &self,
        player: &PlayerId,
        query: &LedgerQuery,
    ) -> Result<Vec<LedgerEntry>> {
        self.enter("ledger_entries").await?;
        let state = self.state.lock().unwrap();
        let mut entries: Vec<LedgerEntry> = state
            .ledger
            .iter()
            .filter(|e| &e.player_id == player && query.matches(e))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        if let Some(limit) = query.limit {
            entries.truncate(limit as usize);
        }
        Ok(entries)
    }
}

#[async_trait]
impl ReferralDirectory for MemoryBackend {
    async fn claim_code(&self, code: &ReferralCode, player: &PlayerId) -> Result<bool> {
        self.enter("claim_code").await?;
        let mut state = self.state.lock().unwrap();
        if state.codes.contains_key(code) {
            return Ok(false);
        }
        state.codes.insert(code.clone(), player.clone());
        Ok(true)
    }

    async fn resolve_code(&self, code: &ReferralCode) -> Result<Option<PlayerId>> {
        self.enter("resolve_code").await?;
        Ok(self.state.lock().unwrap().codes.get(code).cloned())
    }
}

#[async_trait]
impl EventSink for MemoryBackend {
    async fn emit(&self, event: &AnalyticsEvent) -> Result<()> {
        self.enter("emit").await?;
        self.state.lock().unwrap().events.push(event.clone());
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemoryBackend {
    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.enter("get_setting").await?;
        Ok(self.state.lock().unwrap().settings.get(key).cloned())
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        self.enter("put_setting").await?;
        self.state
            .lock()
            .unwrap()
            .settings
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn replace_setting(&self, key: &str, expected: &str, value: &str) -> Result<bool> {
        self.enter("replace_setting").await?;
        let mut state = self.state.lock().unwrap();
        match state.settings.get_mut(key) {
            Some(current) if current == expected => {
                *current = value.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Fixed point in time used across service tests (a Wednesday, 10:00 UTC)
pub fn test_epoch() -> chrono::DateTime<Utc> {
    use chrono::TimeZone;
    Utc.with_ymd_and_hms(2024, 3, 13, 10, 0, 0).unwrap()
}
