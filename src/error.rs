//! Error types for the transport, protocol and driver layers.
//!
//! Each layer owns its error enum; the driver folds the lower two into
//! [`DriverError`] so callers match on one type.

use crate::port::PortError;
use thiserror::Error;

/// Failures of the serial request/response channel.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The port could not be opened or configured. Fatal for the session.
    #[error("failed to open serial port '{port}': {source}")]
    Connection {
        port: String,
        #[source]
        source: PortError,
    },

    /// A write or read failed in the middle of an exchange.
    #[error("serial I/O failed: {0}")]
    Io(#[source] PortError),

    /// The command cannot be framed (non-ASCII or contains the terminator).
    #[error("invalid command {0:?}: commands must be ASCII without CR")]
    InvalidCommand(String),

    /// The transport has already been closed.
    #[error("serial port is closed")]
    Closed,
}

/// A status reply that cannot be turned into a reading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fewer bytes than the fixed status layout needs.
    #[error("status reply too short: {len} bytes, need at least {min}")]
    TooShort { len: usize, min: usize },

    /// The reply never reached its terminator before the response timeout.
    #[error("status reply timed out after {len} bytes without a terminator")]
    Unterminated { len: usize },

    /// The temperature field is not four ASCII hex digits.
    #[error("invalid temperature field {0:?}")]
    InvalidTemperature(String),
}

/// Errors returned by [`Driver`](crate::Driver) operations.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A setpoint outside the programmer's accepted range. Nothing was sent.
    #[error("{parameter} {value} is out of range (must be below {max})")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        max: f64,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl DriverError {
    /// Whether the failure is local to one request and the next poll may
    /// succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Decode(_) => true,
            Self::Transport(TransportError::Io(e)) => e.is_no_data(),
            _ => false,
        }
    }
}

/// Errors raised while stopping the background monitor.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("monitor task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
