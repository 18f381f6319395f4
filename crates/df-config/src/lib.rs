//! # df-config
//!
//! Layered settings: built-in defaults, then an optional `devflow.toml`,
//! then `DEVFLOW__SECTION__KEY` environment variables (a `.env` file is
//! loaded into the environment first).

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

pub const ENV_PREFIX: &str = "DEVFLOW";
pub const CONFIG_FILE: &str = "devflow";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthSettings {
    /// Signing secret for identity webhooks (`whsec_...`). Without it the
    /// webhook route rejects every delivery.
    #[serde(default)]
    pub webhook_secret: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    pub json: bool,
}

impl Settings {
    /// Reads `.env`, `devflow.toml` (optional) and the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => warn!(error = %e, "ignoring unreadable .env"),
        }
        Self::from_sources(Some(CONFIG_FILE), Environment::with_prefix(ENV_PREFIX))
    }

    /// Builds settings from an optional config file and an environment
    /// source; the latter takes precedence.
    pub fn from_sources(file: Option<&str>, env: Environment) -> Result<Self, SettingsError> {
        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite:devflow.db")?
            .set_default("database.max_connections", 5)?
            .set_default("log.filter", "info")?
            .set_default("log.json", false)?;

        if let Some(name) = file {
            builder = builder.add_source(File::with_name(name).required(false));
        }

        let settings: Settings = builder
            .add_source(env.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.server.port == 0 {
            return Err(SettingsError::Invalid { key: "server.port", reason: "must be non-zero".into() });
        }
        if self.database.max_connections == 0 {
            return Err(SettingsError::Invalid {
                key: "database.max_connections",
                reason: "must be at least 1".into(),
            });
        }
        if self.database.url.trim().is_empty() {
            return Err(SettingsError::Invalid { key: "database.url", reason: "must not be empty".into() });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}
