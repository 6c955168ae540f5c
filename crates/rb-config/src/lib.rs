//! # rb-config
//!
//! Runtime settings. Layers, lowest priority first: built-in defaults, an
//! optional `recipe-board.toml` in the working directory, then `RB__`-prefixed
//! environment variables (`RB__SERVER__PORT=9000`). A `.env` file is read
//! into the environment first.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub gateway: GatewaySettings,
    pub session: SessionSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct GatewaySettings {
    pub base_url: String,
    pub api_key: SecretString,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct SessionSettings {
    pub secret: SecretString,
    /// Lifetime of a login, in seconds
    pub max_age_secs: u64,
    /// Mark the cookie `Secure`; enable behind TLS
    pub secure: bool,
}

#[derive(Debug, Deserialize)]
pub struct LogSettings {
    /// Emit JSON lines instead of human-readable logs
    pub json: bool,
}

const DEV_SESSION_SECRET: &str = "recipe-board-dev-secret";

impl Settings {
    /// Reads `.env`, the optional config file and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load_from(config::Environment::with_prefix("RB").separator("__"))
    }

    /// Builds settings on top of the given environment source.
    pub fn load_from(env: config::Environment) -> Result<Self, ConfigError> {
        let settings: Settings = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite:recipe_board.db")?
            .set_default("gateway.base_url", "https://api.spoonacular.com")?
            .set_default("gateway.api_key", "")?
            .set_default("gateway.timeout_secs", 10)?
            .set_default("session.secret", DEV_SESSION_SECRET)?
            .set_default("session.max_age_secs", 7 * 24 * 60 * 60)?
            .set_default("session.secure", false)?
            .set_default("log.json", false)?
            .add_source(config::File::with_name("recipe-board").required(false))
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Logs the settings that still hold development defaults. Call after
    /// the subscriber is installed.
    pub fn warn_on_insecure_defaults(&self) {
        if self.session.secret.expose_secret() == DEV_SESSION_SECRET {
            tracing::warn!("RB__SESSION__SECRET not set, using the development secret");
        }
        if self.gateway.api_key.expose_secret().is_empty() {
            tracing::warn!("RB__GATEWAY__API_KEY not set, recipe API calls will be rejected");
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("RB")
            .separator("__")
            .source(Some(map))
    }

    #[test]
    fn defaults_apply_without_environment() {
        let settings = Settings::load_from(env(&[])).unwrap();
        assert_eq!(settings.bind_addr(), "127.0.0.1:8080");
        assert_eq!(settings.database.url, "sqlite:recipe_board.db");
        assert_eq!(settings.gateway.timeout_secs, 10);
        assert!(!settings.log.json);
        assert_eq!(settings.session.max_age_secs, 604_800);
        assert!(!settings.session.secure);
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::load_from(env(&[
            ("RB__SERVER__PORT", "9000"),
            ("RB__GATEWAY__API_KEY", "abc123"),
            ("RB__LOG__JSON", "true"),
            ("RB__SESSION__MAX_AGE_SECS", "3600"),
            ("RB__SESSION__SECURE", "true"),
        ]))
        .unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.gateway.api_key.expose_secret(), "abc123");
        assert!(settings.log.json);
        assert_eq!(settings.session.max_age_secs, 3600);
        assert!(settings.session.secure);
    }

    #[test]
    fn secrets_stay_out_of_debug_output() {
        let settings = Settings::load_from(env(&[("RB__SESSION__SECRET", "hunter2")])).unwrap();
        assert!(!format!("{settings:?}").contains("hunter2"));
    }
}
