//! Shared type definitions and newtypes

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest player identifier the store accepts
pub const MAX_PLAYER_ID_LEN: usize = 64;

/// Length of a referral code
pub const REFERRAL_CODE_LEN: usize = 8;

/// Alphabet referral codes are drawn from
pub const REFERRAL_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Identifier of a player account in the external store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Validate a raw identifier (trimmed, non-empty, no whitespace)
    pub fn parse(raw: &str) -> Result<Self> {
        let id = raw.trim();
        if id.is_empty() {
            return Err(Error::InvalidArgument("player id is required".to_string()));
        }
        if id.len() > MAX_PLAYER_ID_LEN {
            return Err(Error::InvalidArgument(format!(
                "player id longer than {} characters",
                MAX_PLAYER_ID_LEN
            )));
        }
        if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(Error::InvalidArgument(
                "player id contains whitespace".to_string(),
            ));
        }
        // Stored in `referredBy` for players nobody referred
        if id == crate::NO_REFERRER {
            return Err(Error::InvalidArgument(format!("player id {} is reserved", id)));
        }
        Ok(PlayerId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public 8-character token identifying a referrer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferralCode(String);

impl ReferralCode {
    /// Normalize (trim, upper-case) and validate a user-supplied code
    pub fn parse(raw: &str) -> Result<Self> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() != REFERRAL_CODE_LEN
            || !code.bytes().all(|b| REFERRAL_CODE_ALPHABET.contains(&b))
        {
            return Err(Error::InvalidArgument(format!(
                "referral code must be {} characters of A-Z or 0-9",
                REFERRAL_CODE_LEN
            )));
        }
        Ok(ReferralCode(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferralCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Virtual currencies held by players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// Tickets, the currency rewards and commissions are paid in
    #[serde(rename = "TK")]
    Tickets,
    #[serde(rename = "PT")]
    Points,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Tickets => "TK",
            Currency::Points => "PT",
        }
    }

    pub fn from_code(code: &str) -> Result<Self> {
        match code {
            "TK" => Ok(Currency::Tickets),
            "PT" => Ok(Currency::Points),
            other => Err(Error::InvalidData(format!("unknown currency code {}", other))),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Commission rate as a fraction (0.05 = 5%)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommissionRate(pub f64);

impl CommissionRate {
    pub const ZERO: CommissionRate = CommissionRate(0.0);

    pub fn as_f64(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 <= 0.0
    }

    /// Rate in basis points (0.05 = 500)
    pub fn basis_points(&self) -> i64 {
        (self.0 * 10_000.0).round() as i64
    }

    /// Commission owed on `amount`, rounded down.
    /// Integer math on basis points so 0.07 * 100 is exactly 7.
    pub fn apply(&self, amount: i64) -> i64 {
        if amount <= 0 || self.is_zero() {
            return 0;
        }
        amount.saturating_mul(self.basis_points()) / 10_000
    }
}
