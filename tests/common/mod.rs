//! Shared test utilities.
//!
//! Builds mock programmers with scripted replies and drivers wired to them
//! with short timeouts, so silent-device paths do not slow the suite down.

#![allow(dead_code)]

use stage_programmer::port::MockSerialPort;
use stage_programmer::transport::{Transport, TransportSettings};
use stage_programmer::Driver;
use std::time::Duration;

/// Timing tight enough for tests, loose enough for a loaded CI machine.
pub fn quick_settings() -> TransportSettings {
    TransportSettings {
        response_timeout: Duration::from_millis(50),
        read_timeout: Duration::from_millis(1),
    }
}

/// A terminated `T` reply: status byte, error byte, four reserved bytes and
/// the temperature in tenths as four uppercase hex digits.
pub fn status_reply(status: u8, error: u8, tenths: u16) -> Vec<u8> {
    let mut reply = vec![status, error, b'0', b'0', b'0', b'0'];
    reply.extend_from_slice(format!("{tenths:04X}").as_bytes());
    reply.push(b'\r');
    reply
}

/// Mock programmer that acknowledges every command with an empty line and
/// reports "stopped, 25.0 °C" on `T`.
pub fn mock_programmer(name: &str) -> MockSerialPort {
    let mut port = MockSerialPort::new(name);
    port.set_fallback_reply(b"\r");
    port.set_reply("T", &status_reply(0x01, 0x00, 250));
    port
}

/// Driver over [`mock_programmer`], plus a handle to inspect the wire.
pub fn mock_driver() -> (Driver<MockSerialPort>, MockSerialPort) {
    let port = mock_programmer("MOCK0");
    let driver = Driver::new(Transport::new(port.clone(), quick_settings()));
    (driver, port)
}
