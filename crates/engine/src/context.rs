//! Shared handles and call discipline for the services

use crate::clock::Clock;
use crate::config::EngineConfig;
use chrono::{DateTime, Utc};
use loyalty_core::{AnalyticsEvent, Backend, Error, PlayerId, Result};
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

/// Backend, clock and limits shared by every service
#[derive(Clone)]
pub struct ServiceContext {
    backend: Arc<dyn Backend>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl ServiceContext {
    pub fn new(backend: Arc<dyn Backend>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        Self {
            backend,
            clock,
            config,
        }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Run one store call under the configured timeout
    pub async fn bounded<T, F>(&self, op: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.config.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, timeout_ms = self.config.store_timeout.as_millis() as u64, "store call timed out");
                Err(Error::Timeout(op.to_string()))
            }
        }
    }

    /// Validate a raw player id and make sure the account exists.
    /// Malformed ids are rejected with `InvalidArgument` before any store call.
    /// A well-formed id without an account gets `PlayerNotFound` instead, which
    /// is still a validation error (`ErrorClass::Validation`) but maps to 404.
    pub async fn require_player(&self, raw: &str) -> Result<PlayerId> {
        let player = PlayerId::parse(raw)?;
        if !self
            .bounded("player_exists", self.backend.player_exists(&player))
            .await?
        {
            return Err(Error::PlayerNotFound(player.to_string()));
        }
        Ok(player)
    }

    /// Fire-and-forget analytics; failures are logged, never returned
    pub async fn emit(&self, event: AnalyticsEvent) {
        if let Err(e) = self.bounded("emit", self.backend.emit(&event)).await {
            warn!(event = event.name(), error = %e, "analytics event dropped");
        }
    }
}
