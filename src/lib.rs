//! Stage Programmer Library
//!
//! Serial driver for heating/cooling stage temperature programmers (T92,
//! T93, T94, T95 series and compatible controllers) with a background
//! monitor for live displays.
//!
//! # Modules
//!
//! - `port`: byte-level serial adapters (hardware and mock)
//! - `transport`: exclusive CR-framed request/response channel
//! - `protocol`: command encoding and status/error decoding
//! - `driver`: programmer operations (rate, limit, start, stop, hold, read)
//! - `monitor`: periodic poller publishing temperature, status and error
//! - `config`: TOML configuration with environment overrides
//! - `error`: error types per layer
//!
//! # Example
//!
//! ```no_run
//! use stage_programmer::Driver;
//!
//! let driver = Driver::open("/dev/ttyUSB0")?;
//! driver.ramp(10.0, 150.0)?;
//! let reading = driver.query_reading()?;
//! println!("{:.1} °C, {}", reading.temperature_celsius(), reading.status());
//! # Ok::<(), stage_programmer::DriverError>(())
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod monitor;
pub mod port;
pub mod protocol;
pub mod transport;

pub use driver::{Driver, RampConfig};
pub use error::{DecodeError, DriverError, MonitorError, TransportError};
pub use monitor::{Monitor, MonitorEvent, MonitorSettings, MonitorSnapshot, TimedReading};
pub use port::{MockSerialPort, PortError, SerialPortAdapter, SyncSerialPort};
pub use protocol::{Command, DeviceReading, DeviceStatus, ErrorCondition, ErrorFlags};
pub use transport::{CommandFrame, ResponseFrame, Transport, TransportSettings};

pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
