//! Programmer wire protocol: command encoding and status decoding.
//!
//! Pure functions only; all I/O lives in [`transport`](crate::transport).

pub mod command;
pub mod flags;
pub mod reading;
pub mod status;

pub use command::{Command, MAX_LIMIT_CELSIUS, MAX_RATE_CELSIUS_PER_MIN};
pub use flags::{ErrorCondition, ErrorFlags};
pub use reading::{DeviceReading, STATUS_REPLY_LEN};
pub use status::DeviceStatus;
