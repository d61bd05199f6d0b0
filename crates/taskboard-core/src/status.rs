//! Status resolution.
//!
//! Decides a task's status from the raw status cell and its dates. Rules, in
//! order, first match wins:
//!
//! 1. Status text containing the "delivering today" phrase is `Delayed`.
//! 2. Any other non-empty, non-placeholder status text is kept verbatim.
//! 3. With no usable status text:
//!    - an expected end date strictly before the reference date and no
//!      actual end date gives `Delayed`,
//!    - an actual end date gives `Completed`,
//!    - otherwise `InProgress`.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use taskboard_core::{DateValue, Markers, Status, StatusLabel};
//! use taskboard_core::status::resolve_status;
//!
//! let today = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
//! let expected = DateValue::from_text("2020-01-01");
//!
//! let status = resolve_status("", &expected, &DateValue::Unknown, today, &Markers::default());
//! assert_eq!(status, Status::Known(StatusLabel::Delayed));
//! ```

use chrono::NaiveDate;

use crate::{DateValue, Markers, Status, StatusLabel};

/// Resolve the status of one task against the reference date `today`
pub fn resolve_status(
    raw: &str,
    expected_end: &DateValue,
    actual_end: &DateValue,
    today: NaiveDate,
    markers: &Markers,
) -> Status {
    if markers.is_delivering_today(raw) {
        return Status::Known(StatusLabel::Delayed);
    }

    let raw = raw.trim();
    if !raw.is_empty() && !markers.is_placeholder(raw) {
        return Status::from_text(raw);
    }

    infer_status(expected_end, actual_end, today)
}

/// Date-based inference used when the status cell is empty
pub fn infer_status(expected_end: &DateValue, actual_end: &DateValue, today: NaiveDate) -> Status {
    // Tokens such as the ongoing marker have no date and never count as overdue.
    let overdue = expected_end.as_date().is_some_and(|d| d < today);

    let label = if overdue && !actual_end.is_present() {
        StatusLabel::Delayed
    } else if actual_end.is_present() {
        StatusLabel::Completed
    } else {
        StatusLabel::InProgress
    };
    Status::Known(label)
}
