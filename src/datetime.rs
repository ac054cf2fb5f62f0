//! Date/time utilities for ByteBucket.
//!
//! Timestamps are stored and emitted as UTC strings in the fixed
//! `YYYY-MM-DD HH:MM:SS` form (the same form SQLite's `datetime('now')` produces).

use chrono::{DateTime, NaiveDate, Utc};

/// Storage format for timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a UTC datetime in the storage format.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Current time in the storage format.
pub fn now_timestamp() -> String {
    format_timestamp(&Utc::now())
}

/// Parse a timestamp in the storage format.
///
/// Anything that is not exactly `YYYY-MM-DD HH:MM:SS` with in-range fields
/// (including leap-year aware day bounds) yields `None`.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let bytes = s.as_bytes();
    if bytes.len() != 19 {
        return None;
    }

    for (i, b) in bytes.iter().enumerate() {
        let ok = match i {
            4 | 7 => *b == b'-',
            10 => *b == b' ',
            13 | 16 => *b == b':',
            _ => b.is_ascii_digit(),
        };
        if !ok {
            return None;
        }
    }

    let field = |range: std::ops::Range<usize>| -> u32 {
        bytes[range]
            .iter()
            .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
    };

    let year = field(0..4) as i32;
    let month = field(5..7);
    let day = field(8..10);
    let hour = field(11..13);
    let minute = field(14..16);
    let second = field(17..19);

    // from_ymd_opt rejects month 13, Feb 30, Feb 29 outside leap years, ...
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    // ... and and_hms_opt rejects hour 24, minute 60, second 60.
    let naive = date.and_hms_opt(hour, minute, second)?;
    Some(naive.and_utc())
}

/// Re-emit a stored timestamp in canonical form for API responses.
///
/// Malformed values produce `None` rather than an error.
pub fn normalize_timestamp(datetime_str: &str) -> Option<String> {
    parse_timestamp(datetime_str).map(|dt| format_timestamp(&dt))
}
