//! Referral commission ledger

pub mod codes;
pub mod counter;
mod service;
pub mod stats;

pub use service::ReferralLedger;
