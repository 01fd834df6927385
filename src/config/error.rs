//! Errors raised while resolving `stage-programmer.toml` and its overrides.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The resolved config file exists but could not be read.
    #[error("cannot read stage-programmer config '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has a wrongly typed key.
    #[error("invalid stage-programmer config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value the driver or monitor cannot run with, e.g. a zero poll interval.
    /// `key` is the dotted path such as `serial.read_timeout_ms`.
    #[error("{key} {message}")]
    ValidationError { key: String, message: String },

    /// A `STAGE_PROGRAMMER_*` override that does not parse.
    #[error("{var}: {message}")]
    EnvParseError { var: String, message: String },
}

impl ConfigError {
    pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn env_parse(var: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
