//! Keeper configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_EXPIRATION_DAYS: u32 = 30;
pub const DEFAULT_STORAGE_KEY: &str = "utm_keeper";

/// Which observation wins when more than one is seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttributionMode {
    /// Keep the first valid capture until it expires or is cleared
    #[default]
    FirstTouch,
    /// Every capture with parameters replaces the stored one
    LastTouch,
}

impl fmt::Display for AttributionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributionMode::FirstTouch => f.write_str("first-touch"),
            AttributionMode::LastTouch => f.write_str("last-touch"),
        }
    }
}

impl FromStr for AttributionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first-touch" | "first" => Ok(AttributionMode::FirstTouch),
            "last-touch" | "last" => Ok(AttributionMode::LastTouch),
            other => Err(format!(
                "unknown attribution mode {other:?} (expected first-touch or last-touch)"
            )),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Keeper configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeeperConfig {
    pub mode: AttributionMode,

    /// Lifetime of a captured record, in days
    pub expiration_days: u32,

    /// Substrate key the record lives under
    pub storage_key: String,

    /// Capture once when the keeper is built
    pub auto_capture: bool,

    /// URL to capture from instead of the environment's current URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_url: Option<String>,
}

impl KeeperConfig {
    pub fn new() -> Self {
        Self {
            mode: AttributionMode::FirstTouch,
            expiration_days: DEFAULT_EXPIRATION_DAYS,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            auto_capture: true,
            capture_url: None,
        }
    }

    /// Load from a JSON file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Shallow merge: only fields set in `overrides` change
    pub fn apply(&mut self, overrides: ConfigOverride) {
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        if let Some(days) = overrides.expiration_days {
            self.expiration_days = days;
        }
        if let Some(key) = overrides.storage_key {
            self.storage_key = key;
        }
        if let Some(auto_capture) = overrides.auto_capture {
            self.auto_capture = auto_capture;
        }
        if let Some(url) = overrides.capture_url {
            self.capture_url = url;
        }
    }

    pub fn merged(mut self, overrides: ConfigOverride) -> Self {
        self.apply(overrides);
        self
    }
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial configuration; `None` fields leave the current value alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverride {
    pub mode: Option<AttributionMode>,
    pub expiration_days: Option<u32>,
    pub storage_key: Option<String>,
    pub auto_capture: Option<bool>,

    /// `Some(None)` clears the configured URL; in JSON that is an explicit `null`
    #[serde(
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub capture_url: Option<Option<String>>,
}

/// A field that is present in the input, even as `null`, becomes `Some`
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl ConfigOverride {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
