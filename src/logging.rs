//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence over `logging.level` when both are set.

use crate::config::{ConfigError, ConfigResult, LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Build the filter for `config`, letting `RUST_LOG` win.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install a global fmt subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig) -> ConfigResult<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    result.map_err(|e| ConfigError::LoggingInit(e.to_string()))
}
