//! Spreadsheet date-serial decoding.
//!
//! Workbooks store dates as day counts where serial 25569 is 1970-01-01
//! (serial 1 being 1900-01-01 under the 1900 leap-year convention). Decoding
//! is total: anything that is not a usable serial comes back unchanged as a
//! token, or as `Unknown` when empty.

use std::sync::OnceLock;

use chrono::{Days, NaiveDate};
use regex::Regex;
use tracing::trace;

use crate::{Cell, DateValue, Markers};

/// Serial number of 1970-01-01
pub const UNIX_EPOCH_SERIAL: i64 = 25569;

/// Alphanumeric codes such as `A12` or `L3` standing in for a date
fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[A-Z]\d+").expect("static pattern"))
}

/// True for values kept verbatim instead of being decoded
pub fn is_passthrough_token(text: &str, markers: &Markers) -> bool {
    markers.is_ongoing(text) || code_pattern().is_match(text)
}

/// Convert a day-count serial to a calendar date.
///
/// Fractional serials (time of day) are floored. Returns `None` for
/// non-finite input or results outside the representable range.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let days = (serial - UNIX_EPOCH_SERIAL as f64).floor();
    if days.abs() > 1.0e9 {
        return None;
    }
    let days = days as i64;
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    if days >= 0 {
        epoch.checked_add_days(Days::new(days as u64))
    } else {
        epoch.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// Serial number of a calendar date
pub fn date_to_serial(date: NaiveDate) -> i64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (date - epoch).num_days() + UNIX_EPOCH_SERIAL
}

/// Decode a raw cell into a date value. Never fails.
pub fn decode_date(cell: &Cell, markers: &Markers) -> DateValue {
    match cell {
        Cell::Empty => DateValue::Unknown,
        Cell::Bool(b) => DateValue::Token(b.to_string()),
        Cell::Number(n) => decode_serial(*n, &cell.as_text()),
        Cell::Text(text) => decode_text(text, markers),
    }
}

/// Decode a textual cell value; the string form of `decode_date`
pub fn decode_text(text: &str, markers: &Markers) -> DateValue {
    let trimmed = text.trim();
    if trimmed.is_empty() || markers.is_placeholder(trimmed) {
        return DateValue::Unknown;
    }
    if is_passthrough_token(trimmed, markers) {
        return DateValue::Token(trimmed.to_string());
    }
    match trimmed.parse::<f64>() {
        Ok(serial) => decode_serial(serial, trimmed),
        Err(_) => DateValue::from_text(trimmed),
    }
}

fn decode_serial(serial: f64, raw: &str) -> DateValue {
    match serial_to_date(serial) {
        Some(date) => DateValue::Date(date),
        None => {
            trace!(raw, "date serial out of range, keeping raw value");
            DateValue::from_text(raw)
        }
    }
}
