//! Data models for loyalty entities

mod events;
mod ledger;
mod raffle;
mod referral;
mod reward;
mod wheel;

pub use events::*;
pub use ledger::*;
pub use raffle::*;
pub use referral::*;
pub use reward::*;
pub use wheel::*;
