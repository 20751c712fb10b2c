//! Runtime settings resolved once at startup.
//!
//! The same router serves three deployment variants that differ in key
//! schema, scan page size and optimistic locking. Everything else a handler
//! needs to know about its deployment (table, region, environment label) is
//! carried here so that no handler reads the process environment.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use tablegate_domain::key::KeySchema;

/// Table name used by the `basic` variant when none is configured.
pub const BASIC_TABLE_NAME: &str = "basic-serverless-table";
/// Table name used by the `test` variant when none is configured.
pub const TEST_TABLE_NAME: &str = "test-serverless-table";
/// Region reported when `AWS_REGION` is unset.
pub const DEFAULT_REGION: &str = "us-west-2";
/// Page size applied to scans in the `advanced` variant.
pub const ADVANCED_SCAN_LIMIT: usize = 50;

/// Deployment flavour of the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Single `id` key, unbounded scans, last-writer-wins updates.
    Basic,
    /// Composite `pk`/`sk` key, paged scans, version-guarded updates.
    #[default]
    Advanced,
    /// Same behaviour as `basic`; deployed to verify store connectivity.
    Test,
}

impl Variant {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
            Self::Test => "test",
        }
    }

    #[must_use]
    pub fn key_schema(self) -> KeySchema {
        match self {
            Self::Advanced => KeySchema::Composite,
            Self::Basic | Self::Test => KeySchema::Simple,
        }
    }

    /// Maximum number of items a single `GET /items` evaluates.
    #[must_use]
    pub fn scan_limit(self) -> Option<usize> {
        match self {
            Self::Advanced => Some(ADVANCED_SCAN_LIMIT),
            Self::Basic | Self::Test => None,
        }
    }

    /// Whether updates are guarded by the caller's `version`.
    #[must_use]
    pub fn checks_version(self) -> bool {
        matches!(self, Self::Advanced)
    }

    #[must_use]
    pub fn default_service_name(self) -> &'static str {
        match self {
            Self::Basic => "basic-serverless-api",
            Self::Advanced => "advanced-serverless-api",
            Self::Test => "test-serverless-api",
        }
    }

    /// Fallback table name; `advanced` has none and must be configured.
    #[must_use]
    pub fn default_table_name(self) -> Option<&'static str> {
        match self {
            Self::Basic => Some(BASIC_TABLE_NAME),
            Self::Test => Some(TEST_TABLE_NAME),
            Self::Advanced => None,
        }
    }
}

impl FromStr for Variant {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "advanced" => Ok(Self::Advanced),
            "test" => Ok(Self::Test),
            _ => Err(SettingsError::UnknownVariant(s.to_string())),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment environment label (`development`, `staging`, `production`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment(String);

impl Environment {
    pub const DEVELOPMENT: &'static str = "development";

    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Internal error text is only returned to callers in development.
    #[must_use]
    pub fn exposes_error_details(&self) -> bool {
        self.0 == Self::DEVELOPMENT
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self(Self::DEVELOPMENT.to_string())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors raised while resolving [`ServiceSettings`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("TABLE_NAME must be set for the {0} variant")]
    MissingTableName(Variant),

    #[error("unknown variant `{0}` (expected basic, advanced or test)")]
    UnknownVariant(String),
}

/// Everything a handler knows about its deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub table_name: String,
    pub region: String,
    pub environment: Environment,
    pub variant: Variant,
    /// Name reported by `GET /health`.
    pub service_name: String,
}

impl ServiceSettings {
    /// Settings for `variant` with every optional value at its default.
    #[must_use]
    pub fn new(variant: Variant, table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            region: DEFAULT_REGION.to_string(),
            environment: Environment::default(),
            variant,
            service_name: variant.default_service_name().to_string(),
        }
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Resolve settings through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// Reads `TABLEGATE_VARIANT`, `TABLE_NAME`, `AWS_REGION`, `ENVIRONMENT`
    /// and `SERVICE_NAME`. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownVariant`] for an unrecognised variant
    /// and [`SettingsError::MissingTableName`] when the variant has no
    /// fallback table name and none is given.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let variant = match get("TABLEGATE_VARIANT") {
            Some(value) => value.parse()?,
            None => Variant::default(),
        };
        let table_name = get("TABLE_NAME")
            .or_else(|| variant.default_table_name().map(str::to_string))
            .ok_or(SettingsError::MissingTableName(variant))?;

        Ok(Self {
            table_name,
            region: get("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            environment: get("ENVIRONMENT").map(Environment::new).unwrap_or_default(),
            variant,
            service_name: get("SERVICE_NAME")
                .unwrap_or_else(|| variant.default_service_name().to_string()),
        })
    }

    /// Resolve settings from the process environment.
    ///
    /// # Errors
    ///
    /// See [`ServiceSettings::from_lookup`].
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    #[must_use]
    pub fn key_schema(&self) -> KeySchema {
        self.variant.key_schema()
    }
}
