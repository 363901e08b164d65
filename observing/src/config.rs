//! Validation settings.
//!
//! Settings are read from an `observing.toml` file and/or the environment.
//! The only knob today is what to do with constraint fields the model does
//! not recognize.
//!
//! ```toml
//! [validation]
//! extra_fields = "warn"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ObservingError, Result, ValidationError};
use crate::models::ConstraintKind;

/// Environment variable overriding [`ValidationSettings::extra_fields`].
pub const EXTRA_FIELDS_ENV: &str = "OBSERVING_EXTRA_FIELDS";

/// Handling of unrecognized fields on decoded constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraFieldPolicy {
    /// Keep them and write them back out.
    #[default]
    Preserve,
    /// Keep them, but log a warning naming them.
    Warn,
    /// Fail decoding.
    Reject,
}

impl FromStr for ExtraFieldPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "preserve" | "allow" => Ok(Self::Preserve),
            "warn" | "log" => Ok(Self::Warn),
            "reject" | "forbid" => Ok(Self::Reject),
            other => Err(format!("Unknown extra field policy: {}", other)),
        }
    }
}

impl ExtraFieldPolicy {
    pub(crate) fn apply(
        &self,
        kind: ConstraintKind,
        extra: &Map<String, Value>,
    ) -> std::result::Result<(), ValidationError> {
        if extra.is_empty() {
            return Ok(());
        }
        let fields: Vec<String> = extra.keys().cloned().collect();
        match self {
            Self::Preserve => Ok(()),
            Self::Warn => {
                log::warn!("{} constraint carries unrecognized fields {:?}", kind, fields);
                Ok(())
            }
            Self::Reject => Err(ValidationError::DisallowedExtraFields { kind, fields }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservingConfig {
    #[serde(default)]
    pub validation: ValidationSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSettings {
    #[serde(default)]
    pub extra_fields: ExtraFieldPolicy,
}

impl FromStr for ObservingConfig {
    type Err = ObservingError;

    fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ObservingError::Config(format!("Failed to parse config: {}", e)))
    }
}

impl ObservingConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ObservingError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        content.parse()
    }

    /// Load configuration from the first `observing.toml` found in:
    /// 1. Current directory
    /// 2. `config/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self> {
        let search_paths = [
            PathBuf::from("observing.toml"),
            PathBuf::from("config/observing.toml"),
            PathBuf::from("../observing.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                log::debug!("Loading observing config from {}", path.display());
                return Self::from_file(&path);
            }
        }

        Err(ObservingError::Config(
            "No observing.toml found in standard locations".to_string(),
        ))
    }

    /// Defaults, overridden by `OBSERVING_EXTRA_FIELDS` when set.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of this configuration.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(val) = std::env::var(EXTRA_FIELDS_ENV) {
            self.validation.extra_fields = val.parse().map_err(|e| {
                ObservingError::Config(format!("{} is invalid: {}", EXTRA_FIELDS_ENV, e))
            })?;
        }
        Ok(self)
    }
}
