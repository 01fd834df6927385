//! Configuration module.
//!
//! TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! 1. `STAGE_PROGRAMMER_CONFIG` environment variable (explicit path)
//! 2. `./stage-programmer.toml` (current directory)
//! 3. `~/.config/stage-programmer/config.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\stage-programmer\config.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `STAGE_PROGRAMMER_<SECTION>_<KEY>`:
//! - `STAGE_PROGRAMMER_SERIAL_PORT=/dev/ttyUSB0`
//! - `STAGE_PROGRAMMER_MONITOR_POLL_INTERVAL_MS=500`
//! - `STAGE_PROGRAMMER_LOGGING_FORMAT=json`
//!
//! # Example
//!
//! ```rust,no_run
//! use stage_programmer::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let config = loader.config();
//! println!("Poll every {} ms", config.monitor.poll_interval_ms);
//! # Ok::<(), stage_programmer::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{get_default_config_path, resolve_config_path, ConfigLoader};
pub use schema::{Config, LogFormat, LoggingConfig, MonitorConfig, SerialConfig};
