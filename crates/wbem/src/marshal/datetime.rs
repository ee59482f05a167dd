//! Date conversions
//!
//! Two native date forms reach the bridge:
//!
//! - `VT_DATE`: an OLE Automation date, days since 1899-12-30 with the time
//!   of day in the fractional part.
//! - CIM datetime strings (`CIM_DATETIME` properties), fixed width:
//!
//! ```text
//! yyyymmddHHMMSS.mmmmmmsUUU
//! 20230615143022.500000+060
//! ```
//!
//! where `sUUU` is the signed UTC offset in minutes.

use chrono::{Local, TimeZone};

/// Days between 1899-12-30 and 1970-01-01
const OLE_EPOCH_OFFSET_DAYS: f64 = 25569.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Total length of a CIM datetime string
const CIM_DATETIME_LEN: usize = 25;

/// Convert an OLE Automation date to epoch milliseconds
///
/// Dates before the OLE epoch keep a positive time-of-day fraction
/// (-1.25 is 1899-12-29 06:00), so the value is unfolded before scaling.
pub fn ole_date_to_millis(date: f64) -> i64 {
    let days = date.trunc();
    let fraction = (date - days).abs();
    let linear = days + fraction;
    ((linear - OLE_EPOCH_OFFSET_DAYS) * MILLIS_PER_DAY).round() as i64
}

/// A parsed CIM datetime
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CimDateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub microsecond: u32,
    /// UTC offset in minutes; parsed but not applied by [`to_epoch_millis`](Self::to_epoch_millis)
    pub utc_offset_minutes: i32,
}

impl CimDateTime {
    /// Parse the fixed-width form; `None` unless all eight fields match
    pub fn parse(text: &str) -> Option<Self> {
        if text.len() != CIM_DATETIME_LEN || !text.is_ascii() {
            return None;
        }
        let bytes = text.as_bytes();
        if bytes[14] != b'.' || !matches!(bytes[21], b'+' | b'-') {
            return None;
        }

        let year = digits(text, 0, 4)?;
        let month = digits(text, 4, 6)?;
        let day = digits(text, 6, 8)?;
        let hour = digits(text, 8, 10)?;
        let minute = digits(text, 10, 12)?;
        let second = digits(text, 12, 14)?;
        let microsecond = digits(text, 15, 21)?;
        let offset = digits(text, 22, 25)? as i32;
        let utc_offset_minutes = if bytes[21] == b'-' { -offset } else { offset };

        Some(Self {
            year: year as i32,
            month,
            day,
            hour,
            minute,
            second,
            microsecond,
            utc_offset_minutes,
        })
    }

    /// Epoch milliseconds of the fields read as local time
    ///
    /// Microseconds are truncated to milliseconds. Field values the local
    /// calendar cannot represent yield `None`.
    pub fn to_epoch_millis(&self) -> Option<i64> {
        let local = Local
            .with_ymd_and_hms(self.year, self.month, self.day, self.hour, self.minute, self.second)
            .earliest()?;
        Some(local.timestamp_millis() + i64::from(self.microsecond / 1000))
    }
}

fn digits(text: &str, start: usize, end: usize) -> Option<u32> {
    let field = text.get(start..end)?;
    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Convert CIM datetime text to epoch milliseconds
///
/// Anything that does not match the fixed-width form, or names a time the
/// local calendar cannot represent, yields 0.
pub fn cim_datetime_to_millis(text: &str) -> i64 {
    CimDateTime::parse(text)
        .and_then(|dt| dt.to_epoch_millis())
        .unwrap_or(0)
}
