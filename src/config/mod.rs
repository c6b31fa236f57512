//! Configuration module for serial-stream.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_STREAM_CONFIG` environment variable (explicit path)
//! 2. `./serial-stream.toml` (current directory)
//! 3. `~/.config/serial-stream/serial-stream.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\serial-stream\serial-stream.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is: `SERIAL_STREAM_<SECTION>_<KEY>`
//!
//! Examples:
//! - `SERIAL_STREAM_SERIAL_BAUD_RATE=9600`
//! - `SERIAL_STREAM_SERIAL_VTIME=5`
//! - `SERIAL_STREAM_TESTING_PORT=/dev/ttyUSB0`
//!
//! Legacy test variables are also honoured: `TEST_PORT`, `TEST_BAUD`,
//! `TEST_LOOPBACK`, `LOOPBACK_ENABLED`.
//!
//! # Example
//!
//! ```rust,ignore
//! use serial_stream::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let params = loader.config().serial.parameters()?;
//! println!("Default baud: {}", params.baud_rate);
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, LogFormat, LoggingConfig, SerialConfig, TestingConfig};
