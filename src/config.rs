use std::time::Duration;

use tracing::info;

use crate::{store::Manager, ConfigError};


pub const MANAGER_VAR: &str = "SIGCHAT_MANAGER";
pub const USERNAME_VAR: &str = "SIGCHAT_USERNAME";
pub const TICK_VAR: &str = "SIGCHAT_TICK_MS";

/// Settings for the `sigchat` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub manager: Manager,
    pub username: String,
    pub tick: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            manager: Manager::default(),
            username: "Username".into(),
            tick: Duration::from_millis(1000),
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Unset or empty variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name| lookup(name).filter(|value| !value.is_empty());
        let mut config = Self::default();
        if let Some(value) = get(MANAGER_VAR) {
            let name = value.trim().to_ascii_lowercase();
            config.manager = name
                .parse::<Manager>()
                .map_err(|_| ConfigError::UnknownManager {
                    var: MANAGER_VAR,
                    value,
                })?;
        }
        if let Some(value) = get(USERNAME_VAR) {
            config.username = value;
        }
        if let Some(value) = get(TICK_VAR) {
            config.tick = match value.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => return Err(ConfigError::InvalidTick { var: TICK_VAR, value }),
            };
        }
        info!(manager = %config.manager, username = %config.username, tick = ?config.tick, "config loaded");
        Ok(config)
    }
}
