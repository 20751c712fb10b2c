//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `tablegate.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;
use tablegate_app::settings::{ServiceSettings, SettingsError};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Settings reported by and enforced in the item API.
    pub service: ServiceConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// File-level fallbacks for the service settings.
///
/// Each field stands in for the environment variable of the same meaning
/// (`TABLE_NAME`, `AWS_REGION`, ...) when that variable is unset.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub variant: Option<String>,
    pub table_name: Option<String>,
    pub region: Option<String>,
    pub environment: Option<String>,
    pub service_name: Option<String>,
}

impl ServiceConfig {
    fn value(&self, variable: &str) -> Option<String> {
        match variable {
            "TABLEGATE_VARIANT" => self.variant.clone(),
            "TABLE_NAME" => self.table_name.clone(),
            "AWS_REGION" => self.region.clone(),
            "ENVIRONMENT" => self.environment.clone(),
            "SERVICE_NAME" => self.service_name.clone(),
            _ => None,
        }
    }
}

impl Config {
    /// Load configuration from `tablegate.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("tablegate.toml")?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(val) = env("TABLEGATE_HOST") {
            self.server.host = val;
        }
        if let Some(port) = env("TABLEGATE_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = env("TABLEGATE_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = env("TABLEGATE_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = env("TABLEGATE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = env("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Resolve the service settings, environment first, then `[service]`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Settings`] when the settings cannot be
    /// resolved (unknown variant, missing table name).
    pub fn service_settings(&self) -> Result<ServiceSettings, ConfigError> {
        self.service_settings_with(|name| std::env::var(name).ok())
    }

    fn service_settings_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ServiceSettings, ConfigError> {
        let settings = ServiceSettings::from_lookup(|name| {
            env(name)
                .filter(|value| !value.trim().is_empty())
                .or_else(|| self.service.value(name))
        })?;
        Ok(settings)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:tablegate.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "tablegated=info,tablegate=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            variant: None,
            table_name: Some("tablegate-local".to_string()),
            region: None,
            environment: Some("development".to_string()),
            service_name: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// Service settings could not be resolved.
    #[error("invalid service settings")]
    Settings(#[from] SettingsError),
}
