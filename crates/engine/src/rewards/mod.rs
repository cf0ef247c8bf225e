//! Daily reward streak engine

mod service;
pub mod streak;

pub use service::DailyRewards;
pub use streak::{claimed_on, effective_state, ActivityGate};
