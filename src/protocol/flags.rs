//! Error byte (EB1) decoding.
//!
//! The low six bits of EB1 are independent fault flags. Each is tested with
//! its own mask; bits 6 and 7 carry nothing and are ignored.

use bitflags::bitflags;
use serde::{Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Fault flags reported in the error byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ErrorFlags: u8 {
        const COOLING_RATE = 1 << 0;
        const STAGE_DISCONNECTED = 1 << 1;
        const OVERLOAD = 1 << 2;
        const TS1500_OVER_300C = 1 << 3;
        const TS1500_WITH_THM = 1 << 4;
        const RS232_TRANSMISSION = 1 << 5;
    }
}

/// A single fault condition, one per flag bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCondition {
    CoolingRateNotMaintained,
    StageDisconnectedOrOpenCircuit,
    OverloadCurrentProtection,
    Ts1500Exceeded300CInProfile,
    InvalidTs1500ThmCombination,
    Rs232TransmissionProblem,
}

impl ErrorCondition {
    /// In bit order, least significant first.
    pub const ALL: [ErrorCondition; 6] = [
        Self::CoolingRateNotMaintained,
        Self::StageDisconnectedOrOpenCircuit,
        Self::OverloadCurrentProtection,
        Self::Ts1500Exceeded300CInProfile,
        Self::InvalidTs1500ThmCombination,
        Self::Rs232TransmissionProblem,
    ];

    pub fn flag(self) -> ErrorFlags {
        match self {
            Self::CoolingRateNotMaintained => ErrorFlags::COOLING_RATE,
            Self::StageDisconnectedOrOpenCircuit => ErrorFlags::STAGE_DISCONNECTED,
            Self::OverloadCurrentProtection => ErrorFlags::OVERLOAD,
            Self::Ts1500Exceeded300CInProfile => ErrorFlags::TS1500_OVER_300C,
            Self::InvalidTs1500ThmCombination => ErrorFlags::TS1500_WITH_THM,
            Self::Rs232TransmissionProblem => ErrorFlags::RS232_TRANSMISSION,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::CoolingRateNotMaintained => "Cooling rate cannot be maintained",
            Self::StageDisconnectedOrOpenCircuit => {
                "Stage not connected or sensor is open circuit"
            }
            Self::OverloadCurrentProtection => {
                "Current protection has been set due to an overload"
            }
            Self::Ts1500Exceeded300CInProfile => {
                "TS1500 stage tried to exit profile at a temperature > 300°C (not allowed)"
            }
            Self::InvalidTs1500ThmCombination => {
                "TMS92 has a TS1500 and THM stage connected (not allowed)"
            }
            Self::Rs232TransmissionProblem => "Problems with the RS232 data transmission",
        }
    }
}

impl ErrorFlags {
    /// Decode EB1, dropping the unused high bits.
    pub fn from_byte(byte: u8) -> Self {
        Self::from_bits_truncate(byte)
    }

    /// Conditions present, in bit order.
    pub fn conditions(&self) -> impl Iterator<Item = ErrorCondition> + '_ {
        ErrorCondition::ALL
            .into_iter()
            .filter(move |condition| self.contains(condition.flag()))
    }

    pub fn messages(&self) -> Vec<&'static str> {
        self.conditions().map(ErrorCondition::message).collect()
    }
}

impl fmt::Display for ErrorFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("no error");
        }
        f.write_str(&self.messages().join("; "))
    }
}

impl Serialize for ErrorFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.conditions())
    }
}
