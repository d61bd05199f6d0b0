//! # taskboard-core
//!
//! Core domain model and normalization pipeline for taskboard.
//!
//! This crate provides:
//! - Domain types: `Cell`, `DateValue`, `Status`, `Task`, `Dataset`
//! - The normalization pipeline: date decoding, status resolution, progress
//!   estimation and entity matching against allow-lists
//! - Summary aggregation, filtering and sorting for the dashboard and table views
//! - A versioned snapshot schema shared by every view
//! - Error types and the `Renderer` trait
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use taskboard_core::{Cell, FixedClock, Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::default();
//! let clock = FixedClock::new(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
//! let grid = vec![
//!     vec![Cell::text("الموضوع/المهمة"), Cell::text("التاريخ المتوقع لانهاء المهمة")],
//!     vec![Cell::text("Quarterly review"), Cell::Number(45658.0)],
//! ];
//!
//! let dataset = Pipeline::new(&config, &clock).run(&grid).unwrap();
//! assert_eq!(dataset.tasks[0].expected_end_date.to_string(), "2025-01-01");
//! assert_eq!(dataset.tasks[0].status.text(), "متأخر");
//! ```

pub mod clock;
pub mod config;
pub mod date;
pub mod entity;
pub mod pipeline;
pub mod progress;
pub mod query;
pub mod snapshot;
pub mod status;
pub mod summary;
pub mod view;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ColumnLabels, Markers, PipelineConfig};
pub use entity::EntityNormalizer;
pub use pipeline::{Pipeline, SourceKind};
pub use query::{FilterSpec, SortColumn, SortDirection, SortState};
pub use snapshot::{MemoryStore, Snapshot, SnapshotStore, StatusHandoff};
pub use summary::{DepartmentCount, Summary};
pub use view::{DashboardView, Debouncer, PageSize, Pagination, StatusCard, TableView, ViewData};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// ============================================================================
// Cells
// ============================================================================

/// A single spreadsheet cell as delivered by the grid reader
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// True for empty cells and whitespace-only text
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric reading of the cell, accepting numeric strings
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Text reading of the cell; integral numbers print without a fraction
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Bool(b) => b.to_string(),
            Cell::Number(n) => format_number(*n),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_text())
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Row-major grid of cells, header row included
pub type Grid = Vec<Vec<Cell>>;

// ============================================================================
// Dates
// ============================================================================

/// A decoded date field: a calendar date, a passthrough token, or unknown
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DateValue {
    Date(NaiveDate),
    Token(String),
    #[default]
    Unknown,
}

impl DateValue {
    /// Display form of an unknown value
    pub const PLACEHOLDER: &'static str = "-";

    /// Read back a display string produced by `Display`
    pub fn from_text(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == Self::PLACEHOLDER {
            return DateValue::Unknown;
        }
        match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => DateValue::Date(date),
            Err(_) => DateValue::Token(s.to_string()),
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            DateValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// True unless the value is missing or the placeholder
    pub fn is_present(&self) -> bool {
        !matches!(self, DateValue::Unknown)
    }
}

impl std::fmt::Display for DateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DateValue::Token(t) => f.write_str(t),
            DateValue::Unknown => f.write_str(Self::PLACEHOLDER),
        }
    }
}

impl From<String> for DateValue {
    fn from(s: String) -> Self {
        DateValue::from_text(&s)
    }
}

impl From<DateValue> for String {
    fn from(value: DateValue) -> Self {
        value.to_string()
    }
}

// ============================================================================
// Status
// ============================================================================

/// The three canonical task states
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusLabel {
    Completed,
    Delayed,
    InProgress,
}

impl StatusLabel {
    pub const ALL: [StatusLabel; 3] = [
        StatusLabel::Completed,
        StatusLabel::Delayed,
        StatusLabel::InProgress,
    ];

    /// Label as it appears in the source spreadsheet
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLabel::Completed => "مكتمل",
            StatusLabel::Delayed => "متأخر",
            StatusLabel::InProgress => "جاري العمل",
        }
    }

    /// Fragment searched for when counting free-form status text
    pub fn fragment(&self) -> &'static str {
        match self {
            StatusLabel::Completed => "مكتمل",
            StatusLabel::Delayed => "متأخر",
            StatusLabel::InProgress => "جاري",
        }
    }

    /// Stable ASCII key used on the command line and in the handoff marker
    pub fn key(&self) -> &'static str {
        match self {
            StatusLabel::Completed => "completed",
            StatusLabel::Delayed => "delayed",
            StatusLabel::InProgress => "in-progress",
        }
    }

    /// Parse either the ASCII key or the spreadsheet label
    pub fn from_key(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.key().eq_ignore_ascii_case(s) || label.as_str() == s)
    }

    /// Classify status text by substring, checking Completed, Delayed then InProgress.
    ///
    /// Free-form statuses that contain none of the fragments classify as `None`.
    pub fn classify(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|label| text.contains(label.fragment()))
    }

    /// Badge category for display. Never fails: unknown text shows as in progress.
    pub fn badge(text: &str, markers: &Markers) -> Self {
        if text.contains(StatusLabel::Completed.fragment()) {
            StatusLabel::Completed
        } else if text.contains(StatusLabel::Delayed.fragment())
            || markers.is_delivering_today(text)
        {
            StatusLabel::Delayed
        } else {
            StatusLabel::InProgress
        }
    }
}

impl std::fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved task status: a canonical label or trusted verbatim text
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Known(StatusLabel),
    Verbatim(String),
}

impl Status {
    /// Canonical labels map to `Known`; anything else is kept verbatim
    pub fn from_text(s: &str) -> Self {
        let s = s.trim();
        match StatusLabel::ALL.into_iter().find(|l| l.as_str() == s) {
            Some(label) => Status::Known(label),
            None => Status::Verbatim(s.to_string()),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Status::Known(label) => label.as_str(),
            Status::Verbatim(s) => s,
        }
    }

    /// Canonical category of the status, by substring for verbatim text
    pub fn label(&self) -> Option<StatusLabel> {
        match self {
            Status::Known(label) => Some(*label),
            Status::Verbatim(s) => StatusLabel::classify(s),
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Known(StatusLabel::InProgress)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        Status::from_text(&s)
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.text().to_string()
    }
}

impl From<StatusLabel> for Status {
    fn from(label: StatusLabel) -> Self {
        Status::Known(label)
    }
}

// ============================================================================
// Task
// ============================================================================

/// One normalized row of the source spreadsheet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Task subject; drives search and row highlighting
    pub subject: String,
    /// Department, whitespace-collapsed and alef-folded
    #[serde(default)]
    pub department: String,
    /// Responsible people as written, possibly several joined by separators
    #[serde(default)]
    pub responsible: String,
    #[serde(default)]
    pub start_date: DateValue,
    #[serde(default)]
    pub expected_end_date: DateValue,
    #[serde(default)]
    pub actual_end_date: DateValue,
    #[serde(default)]
    pub status: Status,
    /// Completion fraction in [0, 1]
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Columns the pipeline does not interpret, keyed by header label
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Task {
    /// Create a task with the given subject and every other field empty
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            department: String::new(),
            responsible: String::new(),
            start_date: DateValue::Unknown,
            expected_end_date: DateValue::Unknown,
            actual_end_date: DateValue::Unknown,
            status: Status::default(),
            progress: 0.0,
            target_percentage: None,
            notes: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    pub fn responsible(mut self, responsible: impl Into<String>) -> Self {
        self.responsible = responsible.into();
        self
    }

    pub fn start(mut self, date: DateValue) -> Self {
        self.start_date = date;
        self
    }

    pub fn expected_end(mut self, date: DateValue) -> Self {
        self.expected_end_date = date;
        self
    }

    pub fn actual_end(mut self, date: DateValue) -> Self {
        self.actual_end_date = date;
        self
    }

    pub fn with_status(mut self, status: impl Into<Status>) -> Self {
        self.status = status.into();
        self
    }

    pub fn progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self
    }

    /// Row highlight derived from the subject
    pub fn highlight(&self) -> Option<Highlight> {
        Highlight::for_subject(&self.subject)
    }

    /// Display value of the column with the given header label.
    ///
    /// Known labels map to typed fields; other labels read from `extra`.
    pub fn value_for(&self, header: &str, columns: &ColumnLabels) -> String {
        let header = entity::collapse_whitespace(header);
        let matches = |label: &str| entity::collapse_whitespace(label) == header;
        if matches(&columns.subject) {
            self.subject.clone()
        } else if matches(&columns.department) {
            self.department.clone()
        } else if matches(&columns.responsible) {
            self.responsible.clone()
        } else if matches(&columns.start_date) {
            self.start_date.to_string()
        } else if matches(&columns.expected_end_date) {
            self.expected_end_date.to_string()
        } else if matches(&columns.actual_end_date) {
            self.actual_end_date.to_string()
        } else if matches(&columns.status) {
            self.status.text().to_string()
        } else if matches(&columns.progress) {
            format!("{}%", (self.progress * 100.0).round())
        } else if matches(&columns.target_percentage) {
            self.target_percentage
                .map(|t| format!("{}%", (t * 100.0).round()))
                .unwrap_or_default()
        } else if matches(&columns.notes) {
            self.notes.clone().unwrap_or_default()
        } else {
            self.extra
                .iter()
                .find(|(k, _)| entity::collapse_whitespace(k) == header)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        }
    }
}

/// Row highlight categories keyed off the task subject
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Highlight {
    /// Quality and certification work (EFQM, ISO)
    Quality,
    /// Spending plans
    SpendingPlan,
    /// Information security (ISO 27001, cybersecurity)
    Security,
}

impl Highlight {
    pub fn for_subject(subject: &str) -> Option<Self> {
        let subject = subject.to_lowercase();
        if subject.contains("efqm") || subject.contains("iso") {
            Some(Highlight::Quality)
        } else if subject.contains("خطة صرف") {
            Some(Highlight::SpendingPlan)
        } else if subject.contains("27001") || subject.contains("الأمن السيبراني") {
            Some(Highlight::Security)
        } else {
            None
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Highlight::Quality => "highlight-yellow",
            Highlight::SpendingPlan => "highlight-orange",
            Highlight::Security => "highlight-blue",
        }
    }
}

// ============================================================================
// Dataset
// ============================================================================

/// The canonical, ordered task collection produced by one upload
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Header labels of the source sheet, in column order
    pub headers: Vec<String>,
    /// Tasks in source row order
    pub tasks: Vec<Task>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, tasks: Vec<Task>) -> Self {
        Self { headers, tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Recompute the summary from scratch
    pub fn summary(&self, normalizer: &EntityNormalizer) -> Summary {
        Summary::from_tasks(&self.tasks, normalizer)
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Everything a renderer needs: the visible rows plus the dataset summary
#[derive(Clone, Debug)]
pub struct Report<'a> {
    /// Column set to render, in order
    pub headers: &'a [String],
    /// Rows to render, already filtered and sorted
    pub rows: Vec<&'a Task>,
    pub summary: &'a Summary,
    /// Task counts per department, first-seen order
    pub department_counts: Vec<DepartmentCount>,
}

impl<'a> Report<'a> {
    pub fn new(headers: &'a [String], rows: Vec<&'a Task>, summary: &'a Summary) -> Self {
        Self {
            headers,
            rows,
            summary,
            department_counts: Vec::new(),
        }
    }

    pub fn with_department_counts(mut self, counts: Vec<DepartmentCount>) -> Self {
        self.department_counts = counts;
        self
    }
}

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render a report to the output format
    fn render(&self, report: &Report<'_>) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Failure to turn an uploaded file into a dataset
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported file type: {0} (expected .xlsx, .xls or .json)")]
    UnsupportedFile(String),

    #[error("Unreadable file: {0}")]
    Unreadable(String),

    #[error("Header row not found: no row starts with '{0}'")]
    MissingHeaderRow(String),
}

/// Failure to read or write a persisted snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Malformed snapshot: {0}")]
    Malformed(String),

    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u64, expected: u32 },

    #[error("Store error: {0}")]
    Store(String),
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================
