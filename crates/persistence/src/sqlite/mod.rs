//! SQLite database management

mod backend;
mod connection;
mod currency;
mod events;
mod players;
mod referral_codes;
mod settings;

pub use connection::Database;
pub use currency::*;
pub use events::*;
pub use players::*;
pub use referral_codes::*;
pub use settings::*;
