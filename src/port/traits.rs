//! Core traits for serial port abstraction.
//!
//! Defines the `SerialPortAdapter` trait so the transport can run over a real
//! serial port or the scripted mock without caring which.

use super::error::PortError;
use std::time::Duration;

/// Baud rate used by the programmer's RS232 interface.
pub const PROGRAMMER_BAUD_RATE: u32 = 19_200;

/// Parameters for opening the programmer link.
///
/// Framing is fixed by the programmer (8 data bits, no parity, 1 stop bit,
/// RTS/CTS) and applied by [`SyncSerialPort`](super::SyncSerialPort); only
/// the speed and per-read timeout vary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfiguration {
    pub baud_rate: u32,
    /// Timeout of a single read call. Kept short so the transport can enforce
    /// its own overall response deadline.
    pub timeout: Duration,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: PROGRAMMER_BAUD_RATE,
            timeout: Duration::from_millis(50),
        }
    }
}

impl PortConfiguration {
    /// Programmer baud rate with a custom per-read timeout.
    pub fn with_read_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Byte-level serial port I/O.
///
/// Implemented by [`SyncSerialPort`](super::SyncSerialPort) for hardware and
/// [`MockSerialPort`](super::MockSerialPort) for tests.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Implementations report "no
    /// data yet" as an I/O error of kind `WouldBlock` or `TimedOut`.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Block until buffered output has been transmitted.
    fn flush(&mut self) -> Result<(), PortError> {
        Ok(())
    }

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Discard unread input and unsent output.
    fn clear_buffers(&mut self) -> Result<(), PortError>;

    /// Discard unread input only.
    fn clear_input(&mut self) -> Result<(), PortError>;
}
