//! Port abstraction layer for serial communication.
//!
//! The transport talks to a [`SerialPortAdapter`]; hardware goes through
//! [`SyncSerialPort`], tests through [`MockSerialPort`].

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::{MockSerialPort, WireEvent};
pub use sync_port::SyncSerialPort;
pub use traits::*;
