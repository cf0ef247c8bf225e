//! Loyalty Engine - Daily reward streaks, referral commissions, wheel and raffle

pub mod clock;
pub mod config;
pub mod context;
pub mod history;
pub mod raffle;
pub mod referral;
pub mod rewards;
pub mod service;
pub mod wheel;

#[cfg(test)]
mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_game_config, save_game_config, EngineConfig, GameConfig};
pub use context::ServiceContext;
pub use history::TransactionHistory;
pub use raffle::Raffles;
pub use referral::ReferralLedger;
pub use rewards::DailyRewards;
pub use service::LoyaltyService;
pub use wheel::LuckyWheel;
