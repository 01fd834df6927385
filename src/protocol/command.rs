//! Command strings understood by the programmer.

use std::fmt;

/// Rates at or above this many °C/min are refused.
pub const MAX_RATE_CELSIUS_PER_MIN: f64 = 15.0;

/// Limits at or above this many °C are refused.
pub const MAX_LIMIT_CELSIUS: f64 = 1400.0;

/// One programmer instruction, before framing.
///
/// Setpoints carry the integer the device expects: hundredths of a °C/min for
/// the rate, tenths of a °C for the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `R1<n>`: ramp rate in 0.01 °C/min.
    Rate(i64),
    /// `L1<n>`: ramp limit in 0.1 °C.
    Limit(i64),
    /// `S`: start ramping toward the limit.
    Start,
    /// `E`: stop heating or cooling.
    Stop,
    /// `O`: hold the current temperature.
    Hold,
    /// `T`: request the status/temperature block.
    Status,
}

impl Command {
    /// Rate command for `celsius_per_min`, rounded to the device resolution.
    pub fn rate(celsius_per_min: f64) -> Self {
        Self::Rate((celsius_per_min * 100.0).round() as i64)
    }

    /// Limit command for `celsius`, rounded to the device resolution.
    pub fn limit(celsius: f64) -> Self {
        Self::Limit((celsius * 10.0).round() as i64)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rate(hundredths) => write!(f, "R1{hundredths}"),
            Self::Limit(tenths) => write!(f, "L1{tenths}"),
            Self::Start => f.write_str("S"),
            Self::Stop => f.write_str("E"),
            Self::Hold => f.write_str("O"),
            Self::Status => f.write_str("T"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setpoint_encoding() {
        assert_eq!(Command::rate(2.5).to_string(), "R1250");
        assert_eq!(Command::rate(0.01).to_string(), "R11");
        assert_eq!(Command::limit(300.0).to_string(), "L13000");
        assert_eq!(Command::limit(-12.3).to_string(), "L1-123");
    }

    #[test]
    fn test_rounding_not_truncation() {
        // 0.29 * 100 is 28.999999999999996 in binary floating point
        assert_eq!(Command::rate(0.29).to_string(), "R129");
        assert_eq!(Command::limit(0.07).to_string(), "L11");
    }

    #[test]
    fn test_single_letter_commands() {
        assert_eq!(Command::Start.to_string(), "S");
        assert_eq!(Command::Stop.to_string(), "E");
        assert_eq!(Command::Hold.to_string(), "O");
        assert_eq!(Command::Status.to_string(), "T");
    }
}
