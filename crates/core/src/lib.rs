//! Loyalty Core - Shared data models, types, errors and store contracts

pub mod errors;
pub mod models;
pub mod store;
pub mod types;

pub use errors::{Error, ErrorClass, Result};
pub use models::*;
pub use store::*;
pub use types::*;
