//! Port-level error types.
//!
//! Kept separate from the transport and driver errors so the adapters only
//! speak about bytes and devices.

use thiserror::Error;

/// Errors raised by a [`SerialPortAdapter`](super::SerialPortAdapter).
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial port was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The port rejected the requested line parameters.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Timeout error from a duration.
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout(duration)
    }

    /// True when the error only means "nothing arrived within the read
    /// timeout" and the caller may keep waiting.
    pub fn is_no_data(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortError::not_found("/dev/ttyUSB0");
        assert_eq!(err.to_string(), "Serial port not found: /dev/ttyUSB0");

        let err = PortError::config("RTS/CTS not supported");
        assert_eq!(err.to_string(), "Configuration error: RTS/CTS not supported");
    }

    #[test]
    fn test_no_data_classification() {
        let would_block = PortError::Io(std::io::Error::new(
            std::io::ErrorKind::WouldBlock,
            "empty",
        ));
        let timed_out = PortError::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"));
        let broken = PortError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"));

        assert!(would_block.is_no_data());
        assert!(timed_out.is_no_data());
        assert!(PortError::timeout(std::time::Duration::from_millis(50)).is_no_data());
        assert!(!broken.is_no_data());
        assert!(!PortError::not_found("COM9").is_no_data());
    }
}
