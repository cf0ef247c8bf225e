//! Engine tuning and game settings loaded from the settings table

use loyalty_core::{Backend, Result, RewardConfig, WheelConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Settings key for the daily reward table
pub const REWARD_CONFIG_KEY: &str = "reward_config";
/// Settings key for the wheel prize table
pub const WHEEL_CONFIG_KEY: &str = "wheel_config";

/// Limits applied to every call into the store
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound for one store or ledger call
    pub store_timeout: Duration,
    /// Compare-and-set attempts before giving up with `Conflict`
    pub max_write_retries: u32,
    /// Referral codes tried before giving up on a unique one
    pub code_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
            max_write_retries: 8,
            code_attempts: 5,
        }
    }
}

/// Operator-tunable game tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameConfig {
    pub rewards: RewardConfig,
    pub wheel: WheelConfig,
}

/// Load game tables from the settings table, falling back to defaults
/// for missing or unusable entries
pub async fn load_game_config(backend: &dyn Backend) -> GameConfig {
    GameConfig {
        rewards: load_setting(backend, REWARD_CONFIG_KEY, RewardConfig::is_valid).await,
        wheel: load_setting(backend, WHEEL_CONFIG_KEY, WheelConfig::is_valid).await,
    }
}

/// Persist game tables
pub async fn save_game_config(backend: &dyn Backend, config: &GameConfig) -> Result<()> {
    save_setting(backend, REWARD_CONFIG_KEY, &config.rewards).await?;
    save_setting(backend, WHEEL_CONFIG_KEY, &config.wheel).await
}

async fn load_setting<T>(backend: &dyn Backend, key: &str, is_valid: fn(&T) -> bool) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match backend.get_setting(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key, "setting not stored, using default");
            return T::default();
        }
        Err(e) => {
            warn!(key, error = %e, "could not read setting, using default");
            return T::default();
        }
    };

    match serde_json::from_str::<T>(&raw) {
        Ok(value) if is_valid(&value) => value,
        Ok(_) => {
            warn!(key, "stored setting failed validation, using default");
            T::default()
        }
        Err(e) => {
            warn!(key, error = %e, "stored setting is not valid JSON, using default");
            T::default()
        }
    }
}

async fn save_setting<T: Serialize>(backend: &dyn Backend, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    backend.put_setting(key, &json).await
}
