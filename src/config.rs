//! Configuration management for the bridge
//!
//! Configuration is read from a YAML file with environment variable overrides
//! for the account credentials. Every section has defaults so an empty file
//! (or no file at all) yields a usable configuration.

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

mod defaults;

/// Default locations searched when no path is given on the command line
pub const DEFAULT_PATHS: [&str; 2] = ["sense_bridge.yaml", "/etc/sense-bridge/config.yaml"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Parameters delivered to the controller as the custom-parameters event
    /// (`email`, `password`)
    pub custom_params: BTreeMap<String, String>,

    /// Poll cadences
    pub poll: PollConfig,

    /// Monitoring service endpoints
    pub sense: SenseConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Short and long poll intervals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Fast telemetry refresh, seconds
    pub short_poll_secs: u64,

    /// Reconnect and heartbeat, seconds
    pub long_poll_secs: u64,
}

/// Monitoring service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenseConfig {
    /// REST API base URL
    pub api_url: String,

    /// Realtime websocket base URL
    pub realtime_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Directory (or file path whose parent is used) for rotated log files.
    /// No file logging when unset.
    pub file: Option<String>,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,

    /// Number of rotated files to keep
    pub backup_count: u32,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        // An empty document deserializes to unit, not to a map
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from `path` or the default locations, then apply
    /// environment overrides and validate.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match DEFAULT_PATHS.iter().find(|p| Path::new(p).exists()) {
                Some(p) => Self::from_file(p)?,
                None => Config::default(),
            },
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// `SENSE_EMAIL` / `SENSE_PASSWORD` take precedence over the file
    pub fn apply_env_overrides(&mut self) {
        if let Ok(email) = std::env::var("SENSE_EMAIL") {
            self.custom_params.insert("email".to_string(), email);
        }
        if let Ok(password) = std::env::var("SENSE_PASSWORD") {
            self.custom_params.insert("password".to_string(), password);
        }
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.poll.short_poll_secs == 0 {
            return Err(BridgeError::validation(
                "poll.short_poll_secs",
                "Must be greater than 0",
            ));
        }

        if self.poll.long_poll_secs == 0 {
            return Err(BridgeError::validation(
                "poll.long_poll_secs",
                "Must be greater than 0",
            ));
        }

        if self.sense.api_url.trim().is_empty() {
            return Err(BridgeError::validation(
                "sense.api_url",
                "URL cannot be empty",
            ));
        }

        if self.sense.realtime_url.trim().is_empty() {
            return Err(BridgeError::validation(
                "sense.realtime_url",
                "URL cannot be empty",
            ));
        }

        if self.sense.timeout_secs == 0 {
            return Err(BridgeError::validation(
                "sense.timeout_secs",
                "Must be greater than 0",
            ));
        }

        Ok(())
    }

    /// The long poll normally runs less often than the short poll
    pub fn poll_cadence_inverted(&self) -> bool {
        self.poll.short_poll_secs >= self.poll.long_poll_secs
    }
}
