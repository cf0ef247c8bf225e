//! Loyalty Server - HTTP surface over the loyalty engine

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
