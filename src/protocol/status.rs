//! Status byte (SB1) decoding.

use serde::Serialize;
use std::fmt;

/// What the programmer reports it is doing.
///
/// Every byte value maps to a variant; bytes outside the documented table
/// become [`DeviceStatus::Unknown`] carrying the raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Stopped,
    Heating,
    Cooling,
    HoldingAtLimitOrRampEnd,
    HoldingLimitTime,
    HoldingCurrentTemperature,
    Unknown(u8),
}

impl DeviceStatus {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x01 => Self::Stopped,
            0x10 => Self::Heating,
            0x20 => Self::Cooling,
            0x30 => Self::HoldingAtLimitOrRampEnd,
            0x40 => Self::HoldingLimitTime,
            0x50 => Self::HoldingCurrentTemperature,
            other => Self::Unknown(other),
        }
    }

    /// Wording from the programmer manual.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Heating => "heating",
            Self::Cooling => "cooling",
            Self::HoldingAtLimitOrRampEnd => "holding at the limit or limit reached end of a ramp",
            Self::HoldingLimitTime => "holding the limit time",
            Self::HoldingCurrentTemperature => "holding the current temperature",
            Self::Unknown(_) => "problem reading status byte",
        }
    }

    pub fn is_holding(&self) -> bool {
        matches!(
            self,
            Self::HoldingAtLimitOrRampEnd | Self::HoldingLimitTime | Self::HoldingCurrentTemperature
        )
    }

    pub fn is_ramping(&self) -> bool {
        matches!(self, Self::Heating | Self::Cooling)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(byte) => write!(f, "{} (0x{byte:02X})", self.description()),
            _ => f.write_str(self.description()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_bytes() {
        assert_eq!(DeviceStatus::from_byte(0x01), DeviceStatus::Stopped);
        assert_eq!(DeviceStatus::from_byte(0x10), DeviceStatus::Heating);
        assert_eq!(DeviceStatus::from_byte(0x20), DeviceStatus::Cooling);
        assert_eq!(
            DeviceStatus::from_byte(0x30),
            DeviceStatus::HoldingAtLimitOrRampEnd
        );
        assert_eq!(DeviceStatus::from_byte(0x40), DeviceStatus::HoldingLimitTime);
        assert_eq!(
            DeviceStatus::from_byte(0x50),
            DeviceStatus::HoldingCurrentTemperature
        );
    }

    #[test]
    fn test_every_other_byte_is_unknown() {
        let known = [0x01, 0x10, 0x20, 0x30, 0x40, 0x50];
        for byte in 0..=u8::MAX {
            let status = DeviceStatus::from_byte(byte);
            if known.contains(&byte) {
                assert!(!matches!(status, DeviceStatus::Unknown(_)));
            } else {
                assert_eq!(status, DeviceStatus::Unknown(byte));
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(DeviceStatus::Heating.to_string(), "heating");
        assert_eq!(
            DeviceStatus::Unknown(0x7f).to_string(),
            "problem reading status byte (0x7F)"
        );
    }

    #[test]
    fn test_state_groups() {
        assert!(DeviceStatus::HoldingLimitTime.is_holding());
        assert!(!DeviceStatus::Heating.is_holding());
        assert!(DeviceStatus::Cooling.is_ramping());
        assert!(!DeviceStatus::Stopped.is_ramping());
    }
}
