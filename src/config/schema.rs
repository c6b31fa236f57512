//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use super::error::{ConfigError, ConfigResult};
use crate::port::params::control_char;
use crate::port::{BaudRate, CharacterSize, FlowControl, Parity, PortParameters, StopBits};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Log levels accepted by `logging.level`.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Line parameters applied when a port is opened
    pub serial: SerialConfig,
    /// Hardware testing configuration
    pub testing: TestingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Check every section for values the serial layer would reject.
    pub fn validate(&self) -> ConfigResult<()> {
        self.serial.parameters()?;
        self.logging.validate()
    }
}

/// Serial line defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub baud_rate: BaudRate,
    pub character_size: CharacterSize,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Minimum byte count for non-canonical reads (0-255)
    pub vmin: u16,
    /// Non-canonical read timeout in deciseconds (0-255)
    pub vtime: u16,
    /// Port aliases for convenience
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        let params = PortParameters::default();
        Self {
            baud_rate: params.baud_rate,
            character_size: params.character_size,
            parity: params.parity,
            stop_bits: params.stop_bits,
            flow_control: params.flow_control,
            vmin: params.vmin.into(),
            vtime: params.vtime.into(),
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Resolve the configured values into a concrete parameter set.
    pub fn parameters(&self) -> ConfigResult<PortParameters> {
        Ok(PortParameters {
            baud_rate: self.baud_rate,
            character_size: self.character_size,
            parity: self.parity,
            stop_bits: self.stop_bits,
            flow_control: self.flow_control,
            vmin: control_char("serial.vmin", self.vmin)?,
            vtime: control_char("serial.vtime", self.vtime)?,
        })
    }

    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Hardware testing configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TestingConfig {
    /// Device path of the port under test
    pub port: Option<String>,
    /// Test baud rate
    pub baud_rate: BaudRate,
    /// Whether the test port has a TX-RX loopback plug
    pub loopback_enabled: bool,
    /// Test timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: BaudRate::Baud9600,
            loopback_enabled: false,
            timeout_ms: 2000,
        }
    }
}

impl TestingConfig {
    /// Get the test timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error", "off"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> ConfigResult<()> {
        if LOG_LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            Ok(())
        } else {
            Err(ConfigError::validation(
                "logging.level",
                format!("unknown level '{}'", self.level),
            ))
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}
