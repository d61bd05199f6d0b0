//! Progress reading and default estimation.
//!
//! Explicit progress always wins. When a task has none (missing, empty or
//! zero), the default follows the resolved status: Completed 1.0,
//! InProgress 0.5, Delayed the configured `delayed_progress`, and 0.0 for
//! free-form statuses outside the three categories.

use crate::{Cell, Status, StatusLabel};

const IN_PROGRESS_DEFAULT: f64 = 0.5;

/// Read a progress cell as a fraction in [0, 1].
///
/// Accepts fractions (`0.4`), whole percentages (`40`) and percent strings
/// (`"40%"`). Returns `None` for blank or non-numeric cells.
pub fn parse_progress(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => {
            let s = s.trim();
            match s.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f64>().ok()? / 100.0,
                None => s.parse::<f64>().ok()?,
            }
        }
        Cell::Empty | Cell::Bool(_) => return None,
    };
    normalize_fraction(value)
}

/// Clamp a progress value into [0, 1], reading values above 1 as percentages
pub fn normalize_fraction(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let value = if value > 1.0 && value <= 100.0 {
        value / 100.0
    } else {
        value
    };
    Some(value.clamp(0.0, 1.0))
}

/// Default progress for a task with no explicit value
pub fn default_progress(status: &Status, delayed_progress: f64) -> f64 {
    match status.label() {
        Some(StatusLabel::Completed) => 1.0,
        Some(StatusLabel::InProgress) => IN_PROGRESS_DEFAULT,
        Some(StatusLabel::Delayed) => delayed_progress.clamp(0.0, 1.0),
        None => 0.0,
    }
}

/// Keep an explicit non-zero progress, otherwise default by status
pub fn estimate_progress(existing: Option<f64>, status: &Status, delayed_progress: f64) -> f64 {
    match existing.and_then(normalize_fraction) {
        Some(p) if p > 0.0 => p,
        _ => default_progress(status, delayed_progress),
    }
}
