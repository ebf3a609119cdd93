//! # sv-config
//!
//! Typed settings for the snipvault binary, read from `SNIPVAULT__*`
//! environment variables (after loading `.env` if one exists).

use config::{Config, Environment, Map};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "SNIPVAULT";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Development,
    Production,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub environment: RunMode,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub access_secret: SecretString,
    pub refresh_secret: SecretString,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

#[derive(Debug, Deserialize)]
pub struct LogSettings {
    pub json: bool,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub log: LogSettings,
}

impl Settings {
    /// Loads `.env` (if present) and then the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_env(None)
    }

    /// `vars` replaces the process environment; used by tests.
    pub fn from_env(vars: Option<Map<String, String>>) -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.environment", "development")?
            .set_default("database.url", "sqlite:snipvault.db?mode=rwc")?
            .set_default("database.max_connections", 5)?
            .set_default("auth.access_ttl_secs", 24 * 60 * 60)?
            .set_default("auth.refresh_ttl_secs", 7 * 24 * 60 * 60)?
            .set_default("log.json", false)?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        for (name, secret) in [
            ("auth.access_secret", &self.auth.access_secret),
            ("auth.refresh_secret", &self.auth.refresh_secret),
        ] {
            if secret.expose_secret().trim().is_empty() {
                return Err(SettingsError::Invalid(format!("{name} must not be empty")));
            }
        }
        if self.auth.access_ttl_secs <= 0 || self.auth.refresh_ttl_secs <= 0 {
            return Err(SettingsError::Invalid("token lifetimes must be positive".to_string()));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.environment == RunMode::Production
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn defaults_fill_everything_but_secrets() {
        let settings = Settings::from_env(vars(&[
            ("SNIPVAULT__AUTH__ACCESS_SECRET", "a-secret"),
            ("SNIPVAULT__AUTH__REFRESH_SECRET", "r-secret"),
        ]))
        .unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.auth.access_ttl_secs, 86_400);
        assert!(!settings.is_production());
        assert!(!settings.log.json);
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::from_env(vars(&[
            ("SNIPVAULT__AUTH__ACCESS_SECRET", "a-secret"),
            ("SNIPVAULT__AUTH__REFRESH_SECRET", "r-secret"),
            ("SNIPVAULT__SERVER__PORT", "9090"),
            ("SNIPVAULT__SERVER__ENVIRONMENT", "production"),
            ("SNIPVAULT__LOG__JSON", "true"),
        ]))
        .unwrap();
        assert_eq!(settings.server.port, 9090);
        assert!(settings.is_production());
        assert!(settings.log.json);
    }

    #[test]
    fn missing_secrets_fail() {
        assert!(Settings::from_env(vars(&[])).is_err());
        let blank = Settings::from_env(vars(&[
            ("SNIPVAULT__AUTH__ACCESS_SECRET", " "),
            ("SNIPVAULT__AUTH__REFRESH_SECRET", "r-secret"),
        ]));
        assert!(matches!(blank, Err(SettingsError::Invalid(_))));
    }
}
