//! Five-byte history timestamps.
//!
//! Layout (bit masks per byte):
//! - b0: `mm ssssss`  month high bits, second
//! - b1: `mm mmmmmm`  month low bits, minute
//! - b2: `___hhhhh`   hour
//! - b3: `___ddddd`   day of month
//! - b4: `_yyyyyyy`   years since 2000
//!
//! Components are decoded as stored; a pump with a corrupt clock yields
//! out-of-range values which callers validate via [`DeviceTimestamp::to_naive`].

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Encoded size of a history timestamp.
pub const TIMESTAMP_LEN: usize = 5;

/// Device-local date/time components, no timezone attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceTimestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DeviceTimestamp {
    /// Decode from exactly [`TIMESTAMP_LEN`] bytes.
    pub fn from_bytes(b: &[u8; TIMESTAMP_LEN]) -> Self {
        Self {
            second: b[0] & 0b0011_1111,
            minute: b[1] & 0b0011_1111,
            hour: b[2] & 0b0001_1111,
            day: b[3] & 0b0001_1111,
            month: ((b[0] & 0b1100_0000) >> 4) | ((b[1] & 0b1100_0000) >> 6),
            year: 2000 + u16::from(b[4] & 0b0111_1111),
        }
    }

    /// Calendar date/time, or `None` when any component is out of range.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )?
        .and_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )
    }
}

impl std::fmt::Display for DeviceTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}
