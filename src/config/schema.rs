//! Configuration schema definitions.
//!
//! Every section has defaults, so an empty file (or no file) is valid.

use crate::monitor::MonitorSettings;
use crate::transport::TransportSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::{ConfigError, ConfigResult};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial link configuration
    pub serial: SerialConfig,
    /// Background poller configuration
    pub monitor: MonitorConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values the driver cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.response_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "serial.response_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.serial.read_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "serial.read_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.serial.read_timeout_ms > self.serial.response_timeout_ms {
            return Err(ConfigError::validation(
                "serial.read_timeout_ms",
                "must not exceed serial.response_timeout_ms",
            ));
        }
        if self.monitor.poll_interval_ms == 0 {
            return Err(ConfigError::validation(
                "monitor.poll_interval_ms",
                "must be greater than zero",
            ));
        }
        if self.monitor.event_capacity == 0 {
            return Err(ConfigError::validation(
                "monitor.event_capacity",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Serial link section. Line parameters are fixed by the programmer and not
/// configurable; only the port and timing are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port path, e.g. "/dev/ttyUSB0" or "COM3"
    pub port: Option<String>,
    /// Maximum wait for a reply terminator in milliseconds
    pub response_timeout_ms: u64,
    /// Timeout of a single port read in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            response_timeout_ms: 500,
            read_timeout_ms: 50,
        }
    }
}

impl SerialConfig {
    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            response_timeout: Duration::from_millis(self.response_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }
}

/// Background poller section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Time between status queries in milliseconds
    pub poll_interval_ms: u64,
    /// Buffered events per subscriber
    pub event_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            event_capacity: 64,
        }
    }
}

impl MonitorConfig {
    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            event_capacity: self.event_capacity,
        }
    }
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Multi-line format with colors
    Pretty,
    /// Single-line format
    #[default]
    Compact,
}
