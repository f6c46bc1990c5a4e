//! Per-class configuration.
//!
//! The surrounding harness hands each test class a configuration
//! mapping (a JSON object in testbed config files). The engine-relevant
//! keys are lifted into typed fields; everything else stays available
//! to suite code through the `user_params` escape hatch.

use std::fmt;
use std::path::PathBuf;

use log::warn;
use serde_json::{Map, Value};

/// Seconds of slack applied on both sides of a failed case's time
/// window when pulling device-log excerpts.
pub const DEFAULT_ADB_LOG_TIME_OFFSET: i64 = 5;

/// Typed view of one test class's configuration mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassConfig {
    /// Display name of the testbed this class runs against.
    pub testbed_name: String,
    /// Directory the class may write logs and excerpts under.
    pub log_path: PathBuf,
    /// Identifiers of the devices attached to the testbed.
    pub devices: Vec<String>,
    /// Seconds of slack for device-log excerpt bounds.
    pub adb_log_time_offset: i64,
    /// Extra arguments handed to every directly requested test case.
    pub cli_args: Option<Vec<String>>,
    /// Unrecognized configuration keys, preserved verbatim.
    pub user_params: Map<String, Value>,
}

impl Default for ClassConfig {
    fn default() -> Self {
        Self {
            testbed_name: String::new(),
            log_path: PathBuf::from("."),
            devices: Vec::new(),
            adb_log_time_offset: DEFAULT_ADB_LOG_TIME_OFFSET,
            cli_args: None,
            user_params: Map::new(),
        }
    }
}

impl ClassConfig {
    /// Parse a configuration mapping.
    ///
    /// A missing device list is logged as a warning, not an error:
    /// simulated suites run deviceless.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `value` is not a JSON object or a
    /// recognized key has the wrong shape.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ConfigError::new("configuration must be a JSON object"))?;

        let mut config = Self::default();
        for (key, v) in obj {
            match key.as_str() {
                "testbed_name" => {
                    config.testbed_name = expect_str(key, v)?.to_owned();
                }
                "log_path" => {
                    config.log_path = PathBuf::from(expect_str(key, v)?);
                }
                "devices" => {
                    config.devices = expect_str_list(key, v)?;
                }
                "adb_log_time_offset" => {
                    config.adb_log_time_offset = v.as_i64().ok_or_else(|| {
                        ConfigError::new(format!("key \"{key}\" must be an integer"))
                    })?;
                }
                "cli_args" => {
                    config.cli_args = Some(expect_str_list(key, v)?);
                }
                _ => {
                    config.user_params.insert(key.clone(), v.clone());
                }
            }
        }

        if config.devices.is_empty() {
            warn!(
                "No device list in configuration for testbed \"{}\"; \
                 device shortcuts will be unavailable.",
                config.testbed_name
            );
        }
        Ok(config)
    }

    /// Look up an unrecognized configuration key.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.user_params.get(key)
    }
}

fn expect_str<'a>(key: &str, v: &'a Value) -> Result<&'a str, ConfigError> {
    v.as_str()
        .ok_or_else(|| ConfigError::new(format!("key \"{key}\" must be a string")))
}

fn expect_str_list(key: &str, v: &Value) -> Result<Vec<String>, ConfigError> {
    let items = v
        .as_array()
        .ok_or_else(|| ConfigError::new(format!("key \"{key}\" must be a list of strings")))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_owned)
                .ok_or_else(|| ConfigError::new(format!("key \"{key}\" must be a list of strings")))
        })
        .collect()
}

/// An error encountered while reading a configuration mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub message: String,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}
