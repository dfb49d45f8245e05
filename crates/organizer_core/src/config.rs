//! Organizer runtime configuration.
//!
//! # Responsibility
//! - Describe quota tables, default tier, flush policy and logging settings.
//! - Load them from JSON with defaults for every missing field.
//!
//! # Invariants
//! - A config returned by `from_json_str`/`load` has passed `validate()`.

use crate::logging::{default_log_level, normalize_level, normalize_log_dir};
use crate::model::tier::Tier;
use crate::service::quota::QuotaTable;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Logging settings consumed by [`crate::logging::init_logging`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rolling log files; stderr when `None`.
    pub log_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

/// Top-level organizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizerConfig {
    pub quota: QuotaTable,
    /// Tier used when no tier source is attached to the store.
    pub default_tier: Tier,
    /// Flush pending writes right after every accepted mutation.
    pub auto_flush: bool,
    pub logging: LoggingConfig,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            quota: QuotaTable::default(),
            default_tier: Tier::Free,
            auto_flush: true,
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration load errors.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl OrganizerConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Checks logging settings; quota values are accepted as given.
    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.logging.level).map_err(ConfigError::Invalid)?;
        if let Some(dir) = self.logging.log_dir.as_deref() {
            normalize_log_dir(dir).map_err(ConfigError::Invalid)?;
        }
        Ok(())
    }
}
