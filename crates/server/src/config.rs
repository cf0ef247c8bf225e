//! Server settings read from the environment

use anyhow::{Context, Result};
use loyalty_engine::EngineConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const BIND_VAR: &str = "LOYALTY_BIND";
pub const DB_VAR: &str = "LOYALTY_DB";
pub const STORE_TIMEOUT_VAR: &str = "LOYALTY_STORE_TIMEOUT_MS";

const DEFAULT_BIND: &str = "127.0.0.1:8787";
const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub store_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (tests pass a map)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_raw = lookup(BIND_VAR).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse()
            .with_context(|| format!("{} is not a socket address: {}", BIND_VAR, bind_raw))?;

        let db_path = match lookup(DB_VAR) {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_db_path(),
        };

        let store_timeout = match lookup(STORE_TIMEOUT_VAR) {
            Some(raw) => {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be milliseconds: {}", STORE_TIMEOUT_VAR, raw))?;
                Duration::from_millis(ms.max(1))
            }
            None => Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
        };

        Ok(Self {
            bind,
            db_path,
            store_timeout,
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            store_timeout: self.store_timeout,
            ..EngineConfig::default()
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs_next::data_local_dir()
        .map(|p| p.join("LoyaltyPortal"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("loyalty.db")
}
