//! Programmer operations on top of the transport.
//!
//! The driver turns setpoints and actions into command strings, sends them
//! through [`Transport::query`], and decodes status replies. It keeps the
//! last accepted rate and limit but never reads them back from the device.

use crate::error::{DecodeError, DriverError};
use crate::port::{SerialPortAdapter, SyncSerialPort};
use crate::protocol::{Command, DeviceReading, MAX_LIMIT_CELSIUS, MAX_RATE_CELSIUS_PER_MIN};
use crate::transport::{ResponseFrame, Transport, TransportSettings};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

/// Last rate and limit accepted by [`Driver::set_rate`] / [`Driver::set_limit`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RampConfig {
    pub rate_celsius_per_min: f64,
    pub limit_celsius: f64,
}

/// Driver for one programmer on one serial link.
///
/// `Driver` is `Send + Sync`; share it through an `Arc` between the monitor
/// and whatever issues commands. The transport serializes them.
#[derive(Debug)]
pub struct Driver<P: SerialPortAdapter = SyncSerialPort> {
    transport: Transport<P>,
    ramp: Mutex<RampConfig>,
}

impl Driver<SyncSerialPort> {
    /// Open the programmer on `port_name` with default timing.
    pub fn open(port_name: &str) -> Result<Self, DriverError> {
        Ok(Self::new(Transport::open(port_name)?))
    }

    pub fn open_with(port_name: &str, settings: TransportSettings) -> Result<Self, DriverError> {
        Ok(Self::new(Transport::open_with(port_name, settings)?))
    }
}

impl<P: SerialPortAdapter> Driver<P> {
    pub fn new(transport: Transport<P>) -> Self {
        Self {
            transport,
            ramp: Mutex::new(RampConfig::default()),
        }
    }

    pub fn port_name(&self) -> &str {
        self.transport.name()
    }

    pub fn ramp_config(&self) -> RampConfig {
        *self.ramp.lock()
    }

    /// Set the ramp rate in °C/min (resolution 0.01).
    ///
    /// Rates of 15 °C/min and above are refused without touching the wire.
    pub fn set_rate(&self, rate: f64) -> Result<(), DriverError> {
        check_below("rate", rate, MAX_RATE_CELSIUS_PER_MIN)?;
        self.issue(Command::rate(rate))?;
        self.ramp.lock().rate_celsius_per_min = rate;
        info!(rate, "ramp rate set");
        Ok(())
    }

    /// Set the ramp limit in °C (resolution 0.1).
    ///
    /// Limits of 1400 °C and above are refused without touching the wire.
    pub fn set_limit(&self, limit: f64) -> Result<(), DriverError> {
        check_below("limit", limit, MAX_LIMIT_CELSIUS)?;
        self.issue(Command::limit(limit))?;
        self.ramp.lock().limit_celsius = limit;
        info!(limit, "ramp limit set");
        Ok(())
    }

    /// Start heating or cooling toward the limit at the programmed rate.
    pub fn start(&self) -> Result<(), DriverError> {
        self.issue(Command::Start).map(drop)
    }

    /// Stop heating or cooling.
    pub fn stop(&self) -> Result<(), DriverError> {
        self.issue(Command::Stop).map(drop)
    }

    /// Hold the current temperature until the next heat, cool or hold command.
    pub fn hold(&self) -> Result<(), DriverError> {
        self.issue(Command::Hold).map(drop)
    }

    /// Program rate and limit, then start. Stops at the first failure.
    pub fn ramp(&self, rate: f64, limit: f64) -> Result<(), DriverError> {
        self.set_rate(rate)?;
        self.set_limit(limit)?;
        self.start()
    }

    /// Query and decode the status block.
    pub fn query_reading(&self) -> Result<DeviceReading, DriverError> {
        let response = self.transport.query(&Command::Status.to_string())?;
        if !response.is_terminated() {
            return Err(DecodeError::Unterminated {
                len: response.len(),
            }
            .into());
        }
        Ok(DeviceReading::decode(response.bytes())?)
    }

    /// Release the serial port. Later operations fail with a closed-port error.
    pub fn close(&self) -> bool {
        self.transport.close()
    }

    fn issue(&self, command: Command) -> Result<ResponseFrame, DriverError> {
        let text = command.to_string();
        let response = self.transport.query(&text)?;
        debug!(command = %text, reply = ?String::from_utf8_lossy(response.bytes()), "command issued");
        Ok(response)
    }
}

fn check_below(parameter: &'static str, value: f64, max: f64) -> Result<(), DriverError> {
    if value.is_finite() && value < max {
        Ok(())
    } else {
        Err(DriverError::OutOfRange {
            parameter,
            value,
            max,
        })
    }
}
