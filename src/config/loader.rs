//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::{Config, LogFormat};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "STAGE_PROGRAMMER";

/// Config file name looked up in the working directory
const LOCAL_CONFIG_FILE_NAME: &str = "stage-programmer.toml";

/// Config file name inside the per-user config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Per-user config directory name
const APP_DIR_NAME: &str = "stage-programmer";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "STAGE_PROGRAMMER_CONFIG";

/// Loaded configuration and where it came from.
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
    /// Resolution priority (highest to lowest):
    /// 1. `STAGE_PROGRAMMER_CONFIG` environment variable (explicit path)
    /// 2. `./stage-programmer.toml`
    /// 3. `~/.config/stage-programmer/config.toml` (XDG on Linux/macOS)
    /// 4. `%APPDATA%\stage-programmer\config.toml` (Windows)
    /// 5. Built-in defaults
    ///
    /// Environment variables override file values; the result is validated.
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
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Defaults plus any well-formed environment overrides; never fails.
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

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
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

    let cwd_config = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|path| path.exists())
}

/// Get the default config file path for this user.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
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

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Read and parse `STAGE_PROGRAMMER_<suffix>` if it is set.
fn env_value<T: FromStr>(suffix: &str, what: &str) -> ConfigResult<Option<T>> {
    let var = format!("{ENV_PREFIX}_{suffix}");
    match std::env::var(&var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::env_parse(var, format!("not a valid {what}: {raw:?}"))),
        Err(_) => Ok(None),
    }
}

/// Apply environment variable overrides to the configuration.
///
/// Variables follow the pattern `STAGE_PROGRAMMER_<SECTION>_<KEY>`, e.g.
/// `STAGE_PROGRAMMER_SERIAL_PORT=/dev/ttyUSB0` or
/// `STAGE_PROGRAMMER_MONITOR_POLL_INTERVAL_MS=500`.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some(port) = env_value::<String>("SERIAL_PORT", "port")? {
        config.serial.port = Some(port);
    }
    if let Some(ms) = env_value("SERIAL_RESPONSE_TIMEOUT_MS", "timeout")? {
        config.serial.response_timeout_ms = ms;
    }
    if let Some(ms) = env_value("SERIAL_READ_TIMEOUT_MS", "timeout")? {
        config.serial.read_timeout_ms = ms;
    }

    if let Some(ms) = env_value("MONITOR_POLL_INTERVAL_MS", "interval")? {
        config.monitor.poll_interval_ms = ms;
    }
    if let Some(capacity) = env_value("MONITOR_EVENT_CAPACITY", "capacity")? {
        config.monitor.event_capacity = capacity;
    }

    if let Some(level) = env_value::<String>("LOGGING_LEVEL", "level")? {
        config.logging.level = level;
    }
    if let Some(format) = env_value::<String>("LOGGING_FORMAT", "log format")? {
        config.logging.format = match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => {
                return Err(ConfigError::env_parse(
                    format!("{ENV_PREFIX}_LOGGING_FORMAT"),
                    "expected json, pretty or compact",
                ))
            }
        };
    }

    Ok(())
}
