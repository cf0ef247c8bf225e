//! Shared state handed to every request handler

use chrono::{DateTime, Utc};
use loyalty_engine::LoyaltyService;
use loyalty_persistence::Database;

#[derive(Clone)]
pub struct AppState {
    pub service: LoyaltyService,
    /// Direct handle for account creation, which has no engine counterpart
    pub db: Database,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: LoyaltyService, db: Database) -> Self {
        Self {
            service,
            db,
            started_at: Utc::now(),
        }
    }
}
