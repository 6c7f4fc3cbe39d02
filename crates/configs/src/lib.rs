//! # configs
//!
//! Layered settings: built-in defaults, then `.env`, then `HOOKS__*` environment
//! variables (`HOOKS__SERVER__PORT=8080`, `HOOKS__AUTH__TOKEN_SECRET=...`).

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, Environment};
use secrecy::SecretString;
use serde::Deserialize;

pub const ENV_PREFIX: &str = "HOOKS";
const ENV_SEPARATOR: &str = "__";
pub const DEV_TOKEN_SECRET: &str = "hooks-dev-secret-change-me";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub token_secret: SecretString,
    pub access_ttl_hours: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressSettings {
    /// Upper bound on how many days a streak scan walks back. Unbounded when unset.
    #[serde(default)]
    pub max_streak_lookback_days: Option<u32>,
    /// JSON achievement table replacing the built-in one.
    #[serde(default)]
    pub achievements_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub progress: ProgressSettings,
}

impl Settings {
    /// Reads `.env` (if present) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("loaded environment from {}", path.display());
        }
        Self::build(Environment::with_prefix(ENV_PREFIX))
    }

    /// Same layering as [`Settings::load`] over an explicit variable map instead of the process env.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::build(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn build(env: Environment) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("database.url", "sqlite:hooks.db")?
            .set_default("auth.token_secret", DEV_TOKEN_SECRET)?
            .set_default("auth.access_ttl_hours", 24)?
            .set_default("auth.refresh_ttl_days", 30)?
            .add_source(
                env.prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
