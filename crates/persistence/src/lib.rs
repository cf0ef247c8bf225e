//! Loyalty Persistence - SQLite implementation of the player store contracts

pub mod sqlite;

pub use sqlite::*;
