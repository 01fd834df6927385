//! Driver behaviour against a scripted programmer.
//!
//! Covers command formatting for setpoints, range refusal, status decoding
//! through the full query path, and the decode-failure cases.

mod common;

use common::{mock_driver, status_reply};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use stage_programmer::protocol::{DeviceReading, DeviceStatus, ErrorCondition, ErrorFlags};
use stage_programmer::{DecodeError, Driver, DriverError, RampConfig, TransportError};

// ============================================================================
// Setpoints
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rate_below_bound_is_sent_in_hundredths(rate in -50.0f64..15.0) {
        let (driver, port) = mock_driver();

        driver.set_rate(rate).unwrap();

        let expected = format!("R1{}\r", (rate * 100.0).round() as i64);
        prop_assert_eq!(port.written_frames(), vec![expected.into_bytes()]);
        prop_assert_eq!(driver.ramp_config().rate_celsius_per_min, rate);
    }

    #[test]
    fn rate_at_or_above_bound_is_refused(rate in 15.0f64..1.0e6) {
        let (driver, port) = mock_driver();

        let refused = matches!(driver.set_rate(rate), Err(DriverError::OutOfRange { .. }));
        prop_assert!(refused);
        prop_assert!(port.written_frames().is_empty());
        prop_assert_eq!(driver.ramp_config(), RampConfig::default());
    }

    #[test]
    fn limit_below_bound_is_sent_in_tenths(limit in -200.0f64..1400.0) {
        let (driver, port) = mock_driver();

        driver.set_limit(limit).unwrap();

        let expected = format!("L1{}\r", (limit * 10.0).round() as i64);
        prop_assert_eq!(port.written_frames(), vec![expected.into_bytes()]);
        prop_assert_eq!(driver.ramp_config().limit_celsius, limit);
    }

    #[test]
    fn limit_at_or_above_bound_is_refused(limit in 1400.0f64..1.0e6) {
        let (driver, port) = mock_driver();

        let refused = matches!(driver.set_limit(limit), Err(DriverError::OutOfRange { .. }));
        prop_assert!(refused);
        prop_assert!(port.written_frames().is_empty());
    }

    #[test]
    fn temperature_survives_hex_encoding(tenths in 0u16..=0xFFFF) {
        let celsius = f64::from(tenths) / 10.0;
        let reply = status_reply(0x10, 0x00, (celsius * 10.0).round() as u16);

        let reading = DeviceReading::decode(&reply[..reply.len() - 1]).unwrap();

        prop_assert!((reading.temperature_celsius() - celsius).abs() < 0.1);
    }

    #[test]
    fn error_bits_are_independent(byte in 0u8..0x40) {
        let flags = ErrorFlags::from_byte(byte);
        for (bit, condition) in ErrorCondition::ALL.into_iter().enumerate() {
            let set = byte & (1 << bit) != 0;
            prop_assert_eq!(flags.contains(condition.flag()), set);
        }
    }
}

#[test]
fn documented_examples() {
    let (driver, port) = mock_driver();

    driver.set_rate(2.5).unwrap();
    driver.set_limit(300.0).unwrap();

    assert_eq!(
        port.written_frames(),
        vec![b"R1250\r".to_vec(), b"L13000\r".to_vec()]
    );
}

#[test]
fn ramp_programs_then_starts() {
    let (driver, port) = mock_driver();

    driver.ramp(10.0, 150.0).unwrap();

    assert_eq!(
        port.written_frames(),
        vec![b"R11000\r".to_vec(), b"L11500\r".to_vec(), b"S\r".to_vec()]
    );
    assert_eq!(
        driver.ramp_config(),
        RampConfig {
            rate_celsius_per_min: 10.0,
            limit_celsius: 150.0
        }
    );
}

#[test]
fn setpoints_are_per_driver() {
    let (first, _) = mock_driver();
    let (second, _) = mock_driver();

    first.set_rate(7.5).unwrap();

    assert_eq!(first.ramp_config().rate_celsius_per_min, 7.5);
    assert_eq!(second.ramp_config(), RampConfig::default());
}

// ============================================================================
// Status queries
// ============================================================================

#[test]
fn status_query_decodes_every_field() {
    let (driver, mut port) = mock_driver();
    port.set_reply("T", &status_reply(0x10, 0x00, 0x0150));

    let reading = driver.query_reading().unwrap();

    assert_eq!(port.written_frames(), vec![b"T\r".to_vec()]);
    assert_eq!(reading.status(), DeviceStatus::Heating);
    assert!(reading.error_flags().is_empty());
    assert_eq!(reading.error_flags().to_string(), "no error");
    assert_eq!(reading.temperature_raw(), *b"0150");
    assert_eq!(reading.temperature_celsius(), 33.6);
}

#[test]
fn holding_states_are_distinguished() {
    let (driver, mut port) = mock_driver();

    port.set_reply("T", &status_reply(0x40, 0x00, 1500));
    assert_eq!(driver.query_reading().unwrap().status(), DeviceStatus::HoldingLimitTime);

    port.set_reply("T", &status_reply(0x50, 0x00, 1234));
    assert_eq!(
        driver.query_reading().unwrap().status(),
        DeviceStatus::HoldingCurrentTemperature
    );
}

#[test]
fn unknown_status_is_a_value_not_an_error() {
    let (driver, mut port) = mock_driver();
    port.set_reply("T", &status_reply(0x7E, 0x00, 100));

    let reading = driver.query_reading().unwrap();
    assert_eq!(reading.status(), DeviceStatus::Unknown(0x7E));
}

#[test]
fn error_flags_come_from_the_second_byte() {
    let (driver, mut port) = mock_driver();
    port.set_reply("T", &status_reply(0x20, 0b100001, 100));

    let flags = driver.query_reading().unwrap().error_flags();
    assert_eq!(
        flags.conditions().collect::<Vec<_>>(),
        vec![
            ErrorCondition::CoolingRateNotMaintained,
            ErrorCondition::Rs232TransmissionProblem,
        ]
    );
}

#[test]
fn short_reply_produces_no_reading() {
    let (driver, mut port) = mock_driver();
    port.set_reply("T", b"\x10\x00000\r");

    match driver.query_reading() {
        Err(DriverError::Decode(DecodeError::TooShort { len, min })) => {
            assert_eq!(len, 5);
            assert_eq!(min, 10);
        }
        other => panic!("expected a short-reply decode error, got {other:?}"),
    }
}

#[test]
fn reply_without_terminator_produces_no_reading() {
    let (driver, mut port) = mock_driver();
    let mut reply = status_reply(0x10, 0x00, 250);
    reply.pop();
    port.set_reply("T", &reply);

    assert!(matches!(
        driver.query_reading(),
        Err(DriverError::Decode(DecodeError::Unterminated { len: 10 }))
    ));
}

#[test]
fn garbage_temperature_produces_no_reading() {
    let (driver, mut port) = mock_driver();
    port.set_reply("T", b"\x10\x000000zz99\r");

    assert!(matches!(
        driver.query_reading(),
        Err(DriverError::Decode(DecodeError::InvalidTemperature(_)))
    ));
}

#[test]
fn late_reply_is_not_taken_for_the_next_reading() {
    let (driver, mut port) = mock_driver();
    port.set_reply("T", b"");

    assert!(matches!(
        driver.query_reading(),
        Err(DriverError::Decode(DecodeError::Unterminated { len: 0 }))
    ));

    port.enqueue_read(&status_reply(0x10, 0x00, 1000));
    port.set_reply("T", &status_reply(0x10, 0x00, 2000));

    assert_eq!(driver.query_reading().unwrap().temperature_celsius(), 200.0);
}

// ============================================================================
// Connection
// ============================================================================

#[test]
fn opening_a_missing_port_is_a_connection_error() {
    let name = "/dev/nonexistent_stage_programmer";

    match Driver::open(name) {
        Err(DriverError::Transport(TransportError::Connection { port, .. })) => {
            assert_eq!(port, name);
        }
        Err(other) => panic!("expected a connection error, got {other:?}"),
        Ok(_) => panic!("opening a missing port must fail"),
    }
}
