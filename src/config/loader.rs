//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use crate::port::BaudRate;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_STREAM";

/// Config file name
const CONFIG_FILE_NAME: &str = "serial-stream.toml";

/// Application directory under the platform config root
const APP_DIR: &str = "serial-stream";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIAL_STREAM_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Environment variables override any config file values, and the
    /// result is validated before it is returned.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    ///
    /// Environment overrides that fail to parse are ignored here.
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        if apply_env_overrides(&mut config).is_err() || config.validate().is_err() {
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to file.
    pub fn save(&self) -> ConfigResult<()> {
        let path = self
            .config_path
            .as_ref()
            .ok_or_else(|| ConfigError::MissingRequired("No config file path set".to_string()))?;

        save_to_file(&self.config, path)
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }

    /// Reload configuration from file (if path is set).
    pub fn reload(&mut self) -> ConfigResult<()> {
        if let Some(ref path) = self.config_path {
            let mut config = load_from_file(path)?;
            apply_env_overrides(&mut config)?;
            config.validate()?;
            self.config = config;
        }
        Ok(())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|path| path.exists())
}

/// Get the platform-specific config directory.
fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Save configuration to a file.
fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// First set variable among `names`, with the name it was found under.
fn env_lookup(names: &[&str]) -> Option<(String, String)> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok().map(|val| (name.to_string(), val)))
}

fn parse_env<T: FromStr>(var: &str, val: &str, what: &str) -> ConfigResult<T> {
    val.trim()
        .parse()
        .map_err(|_| ConfigError::env_parse(var, format!("Invalid {what}: '{val}'")))
}

fn parse_baud(var: &str, val: &str) -> ConfigResult<BaudRate> {
    let bps: u32 = parse_env(var, val, "baud rate")?;
    BaudRate::from_bps(bps)
        .ok_or_else(|| ConfigError::env_parse(var, format!("Unsupported baud rate {bps}")))
}

fn parse_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `SERIAL_STREAM_<SECTION>_<KEY>`
/// For example:
/// - `SERIAL_STREAM_SERIAL_BAUD_RATE=9600`
/// - `SERIAL_STREAM_SERIAL_VMIN=0`
/// - `SERIAL_STREAM_TESTING_PORT=/dev/ttyUSB0`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Serial overrides
    let var = format!("{ENV_PREFIX}_SERIAL_BAUD_RATE");
    if let Ok(val) = std::env::var(&var) {
        config.serial.baud_rate = parse_baud(&var, &val)?;
    }
    let var = format!("{ENV_PREFIX}_SERIAL_VMIN");
    if let Ok(val) = std::env::var(&var) {
        config.serial.vmin = parse_env(&var, &val, "VMIN")?;
    }
    let var = format!("{ENV_PREFIX}_SERIAL_VTIME");
    if let Ok(val) = std::env::var(&var) {
        config.serial.vtime = parse_env(&var, &val, "VTIME")?;
    }

    // Testing overrides (also support legacy TEST_PORT etc.)
    if let Some((_, val)) = env_lookup(&[&format!("{ENV_PREFIX}_TESTING_PORT"), "TEST_PORT"]) {
        config.testing.port = Some(val);
    }
    if let Some((var, val)) = env_lookup(&[&format!("{ENV_PREFIX}_TESTING_BAUD_RATE"), "TEST_BAUD"]) {
        config.testing.baud_rate = parse_baud(&var, &val)?;
    }
    if let Some((var, val)) =
        env_lookup(&[&format!("{ENV_PREFIX}_TESTING_TIMEOUT_MS"), "TEST_TIMEOUT"])
    {
        config.testing.timeout_ms = parse_env(&var, &val, "timeout")?;
    }
    if let Some((_, val)) = env_lookup(&["LOOPBACK_ENABLED", "TEST_LOOPBACK"]) {
        config.testing.loopback_enabled = parse_flag(&val);
    }

    // Logging overrides
    if let Ok(val) = std::env::var(format!("{ENV_PREFIX}_LOGGING_LEVEL")) {
        config.logging.level = val;
    }

    Ok(())
}

/// Get the default config directory for creating new config files.
pub fn get_default_config_dir() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join(APP_DIR))
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}
