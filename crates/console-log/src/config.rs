//! TOML configuration for recording sessions.
//!
//! Every key is optional:
//!
//! ```toml
//! level = ["log", "warn", "error"]
//! lengthThreshold = 500
//! logger = "console"
//!
//! [stringifyOptions]
//! stringLengthLimit = 2000
//! numOfKeysLimit = 20
//! depthOfLimit = 3
//! ```

use std::path::Path;

use logtap_protocol::constants::DEFAULT_LENGTH_THRESHOLD;
use logtap_protocol::{Method, StringifyOptions};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::options::{LogRecordOptions, LoggerSource};

/// Console a configured session attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggerKind {
    #[default]
    Console,
    /// Recording disabled.
    #[serde(rename = "none")]
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordConfig {
    #[serde(default = "default_level")]
    pub level: Vec<Method>,

    #[serde(default = "default_length_threshold")]
    pub length_threshold: u64,

    #[serde(default)]
    pub logger: LoggerKind,

    #[serde(default)]
    pub stringify_options: StringifyOptions,
}

fn default_level() -> Vec<Method> {
    Method::ALL.to_vec()
}

fn default_length_threshold() -> u64 {
    DEFAULT_LENGTH_THRESHOLD
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            length_threshold: default_length_threshold(),
            logger: LoggerKind::default(),
            stringify_options: StringifyOptions::default(),
        }
    }
}

impl RecordConfig {
    /// Parses and validates TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), levels = config.level.len(), "loaded record config");
        Ok(config)
    }

    /// Rejects a zero `lengthThreshold`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.length_threshold == 0 {
            return Err(ConfigError::Invalid("lengthThreshold must be greater than zero".into()));
        }
        Ok(())
    }

    /// Converts to the options taken by [`crate::install`].
    pub fn into_options(self) -> LogRecordOptions {
        LogRecordOptions {
            level: self.level,
            length_threshold: self.length_threshold,
            stringify_options: self.stringify_options,
            logger: match self.logger {
                LoggerKind::Console => Some(LoggerSource::Console),
                LoggerKind::Disabled => None,
            },
        }
    }
}
