//! Decoding of the reply to the `T` status query.
//!
//! Layout (terminator already stripped):
//!
//! ```text
//! byte  0     SB1 status byte
//! byte  1     EB1 error byte
//! bytes 2..6  reserved
//! bytes 6..10 temperature x10, four ASCII hex digits
//! ```

use super::flags::ErrorFlags;
use super::status::DeviceStatus;
use crate::error::DecodeError;

/// Minimum length of a status reply.
pub const STATUS_REPLY_LEN: usize = 10;

const TEMPERATURE_FIELD: std::ops::Range<usize> = 6..10;

/// One decoded status reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceReading {
    status_byte: u8,
    error_byte: u8,
    temperature_raw: [u8; 4],
    temperature_tenths: u16,
}

impl DeviceReading {
    /// Decode a status reply. Bytes past the fixed layout are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < STATUS_REPLY_LEN {
            return Err(DecodeError::TooShort {
                len: bytes.len(),
                min: STATUS_REPLY_LEN,
            });
        }

        let mut temperature_raw = [0u8; 4];
        temperature_raw.copy_from_slice(&bytes[TEMPERATURE_FIELD]);

        Ok(Self {
            status_byte: bytes[0],
            error_byte: bytes[1],
            temperature_raw,
            temperature_tenths: parse_hex_field(&temperature_raw)?,
        })
    }

    pub fn status_byte(&self) -> u8 {
        self.status_byte
    }

    pub fn error_byte(&self) -> u8 {
        self.error_byte
    }

    /// The four ASCII hex digits as received.
    pub fn temperature_raw(&self) -> [u8; 4] {
        self.temperature_raw
    }

    /// Temperature with one decimal of precision.
    pub fn temperature_celsius(&self) -> f64 {
        f64::from(self.temperature_tenths) / 10.0
    }

    pub fn status(&self) -> DeviceStatus {
        DeviceStatus::from_byte(self.status_byte)
    }

    pub fn error_flags(&self) -> ErrorFlags {
        ErrorFlags::from_byte(self.error_byte)
    }
}

fn parse_hex_field(field: &[u8; 4]) -> Result<u16, DecodeError> {
    let invalid = || DecodeError::InvalidTemperature(String::from_utf8_lossy(field).into_owned());

    // from_str_radix would also accept a leading '+'
    if !field.iter().all(u8::is_ascii_hexdigit) {
        return Err(invalid());
    }
    let digits = std::str::from_utf8(field).map_err(|_| invalid())?;
    u16::from_str_radix(digits, 16).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heating_reply() {
        let reading = DeviceReading::decode(&[0x10, 0x00, 0, 0, 0, 0, b'0', b'1', b'5', b'0'])
            .unwrap();

        assert_eq!(reading.status(), DeviceStatus::Heating);
        assert!(reading.error_flags().is_empty());
        assert_eq!(reading.temperature_celsius(), 33.6);
        assert_eq!(reading.temperature_raw(), *b"0150");
    }

    #[test]
    fn test_lowercase_hex_digits() {
        let reading = DeviceReading::decode(b"\x01\x00\x80\x80\x80\x80ffff").unwrap();
        assert_eq!(reading.temperature_celsius(), 6553.5);
        assert_eq!(reading.status(), DeviceStatus::Stopped);
    }

    #[test]
    fn test_short_reply_is_rejected() {
        assert_eq!(
            DeviceReading::decode(b"\x10\x00abc"),
            Err(DecodeError::TooShort { len: 5, min: 10 })
        );
        assert_eq!(
            DeviceReading::decode(b""),
            Err(DecodeError::TooShort { len: 0, min: 10 })
        );
    }

    #[test]
    fn test_non_hex_temperature_is_rejected() {
        assert_eq!(
            DeviceReading::decode(b"\x10\x00....01G0"),
            Err(DecodeError::InvalidTemperature("01G0".to_string()))
        );
        assert!(DeviceReading::decode(b"\x10\x00....+150").is_err());
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let reading = DeviceReading::decode(b"\x30\x01....00FAextra").unwrap();
        assert_eq!(reading.temperature_celsius(), 25.0);
        assert_eq!(reading.status(), DeviceStatus::HoldingAtLimitOrRampEnd);
        assert_eq!(reading.error_byte(), 0x01);
    }
}
