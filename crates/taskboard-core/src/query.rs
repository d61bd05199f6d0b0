//! Table filtering and sorting.
//!
//! Nothing here mutates the dataset. Filtering yields the indices of the
//! matching tasks in source order; sorting reorders such an index list.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::entity::{fold_alef, normalize_department, split_responsible};
use crate::{EntityNormalizer, Markers, PipelineConfig, StatusLabel, Task};

// ============================================================================
// Filtering
// ============================================================================

/// Compound table filter; every set field must match
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSpec {
    /// Case-insensitive substring of the subject
    pub search: String,
    /// Exact department, compared after normalization
    pub department: Option<String>,
    /// Status category; empty or unrecognised keys disable the predicate
    #[serde(deserialize_with = "lenient_status")]
    pub status: Option<StatusLabel>,
    /// Substring match against the split responsible names, either way round
    pub responsible: Option<String>,
    /// Inclusive start-date bounds; empty or invalid bounds are ignored
    #[serde(deserialize_with = "lenient_bound")]
    pub start_from: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_bound")]
    pub start_to: Option<NaiveDate>,
    /// Inclusive minimum progress fraction
    pub min_progress: f64,
}

impl FilterSpec {
    /// True when no predicate is active
    pub fn is_empty(&self) -> bool {
        *self == FilterSpec::default()
    }

    pub fn matches(&self, task: &Task, normalizer: &EntityNormalizer, markers: &Markers) -> bool {
        let search = self.search.trim().to_lowercase();
        if !search.is_empty() && !task.subject.to_lowercase().contains(&search) {
            return false;
        }

        if let Some(department) = self.department.as_deref().filter(|d| !d.trim().is_empty()) {
            if normalize_department(&task.department) != normalize_department(department) {
                return false;
            }
        }

        if let Some(status) = self.status {
            if !status_matches(status, task.status.text(), markers) {
                return false;
            }
        }

        if let Some(responsible) = self.responsible.as_deref().filter(|r| !r.trim().is_empty()) {
            if !normalizer.responsible_matches(&task.responsible, responsible) {
                return false;
            }
        }

        // A start value that is not a date never fails the range.
        if let Some(start) = task.start_date.as_date() {
            if self.start_from.is_some_and(|from| start < from)
                || self.start_to.is_some_and(|to| start > to)
            {
                return false;
            }
        }

        task.progress >= self.min_progress
    }

    /// Indices of matching tasks, in dataset order
    pub fn filter_indices(
        &self,
        tasks: &[Task],
        normalizer: &EntityNormalizer,
        markers: &Markers,
    ) -> Vec<usize> {
        tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| self.matches(task, normalizer, markers))
            .map(|(index, _)| index)
            .collect()
    }
}

/// Status filter semantics: Delayed also covers "delivering today",
/// InProgress also covers the bare ongoing marker
pub fn status_matches(filter: StatusLabel, text: &str, markers: &Markers) -> bool {
    match filter {
        StatusLabel::Completed => text.contains(StatusLabel::Completed.fragment()),
        StatusLabel::Delayed => {
            text.contains(StatusLabel::Delayed.fragment()) || markers.is_delivering_today(text)
        }
        StatusLabel::InProgress => {
            text.contains(StatusLabel::InProgress.fragment()) || markers.is_ongoing(text)
        }
    }
}

/// Parse a `YYYY-MM-DD` range bound; anything else disables the bound
pub fn parse_bound(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

fn lenient_bound<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_bound))
}

fn lenient_status<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<StatusLabel>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(str::trim).and_then(StatusLabel::from_key))
}

// ============================================================================
// Sorting
// ============================================================================

/// Sortable table columns
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortColumn {
    Subject,
    Department,
    Responsible,
    StartDate,
    ExpectedEndDate,
    ActualEndDate,
    Status,
    Progress,
}

impl SortColumn {
    pub const ALL: [SortColumn; 8] = [
        SortColumn::Subject,
        SortColumn::Department,
        SortColumn::Responsible,
        SortColumn::StartDate,
        SortColumn::ExpectedEndDate,
        SortColumn::ActualEndDate,
        SortColumn::Status,
        SortColumn::Progress,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SortColumn::Subject => "subject",
            SortColumn::Department => "department",
            SortColumn::Responsible => "responsible",
            SortColumn::StartDate => "start-date",
            SortColumn::ExpectedEndDate => "expected-end-date",
            SortColumn::ActualEndDate => "actual-end-date",
            SortColumn::Status => "status",
            SortColumn::Progress => "progress",
        }
    }

    pub fn from_key(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == s.trim())
    }

    /// Compare two tasks on this column, ascending.
    ///
    /// Date columns order real dates chronologically and put tokens and
    /// unknown values after them.
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortColumn::Subject => a.subject.cmp(&b.subject),
            SortColumn::Department => a.department.cmp(&b.department),
            SortColumn::Responsible => a.responsible.cmp(&b.responsible),
            SortColumn::StartDate => compare_dates(a.start_date.as_date(), b.start_date.as_date()),
            SortColumn::ExpectedEndDate => compare_dates(
                a.expected_end_date.as_date(),
                b.expected_end_date.as_date(),
            ),
            SortColumn::ActualEndDate => {
                compare_dates(a.actual_end_date.as_date(), b.actual_end_date.as_date())
            }
            SortColumn::Status => a.status.text().cmp(b.status.text()),
            SortColumn::Progress => a.progress.total_cmp(&b.progress),
        }
    }
}

fn compare_dates(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Single active sort column and its direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<SortColumn>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self {
            column: Some(column),
            direction,
        }
    }

    /// Header click: same column flips direction, a new column starts ascending
    pub fn click(&mut self, column: SortColumn) {
        if self.column == Some(column) {
            self.direction = self.direction.toggled();
        } else {
            self.column = Some(column);
            self.direction = SortDirection::Asc;
        }
    }

    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let Some(column) = self.column else {
            return Ordering::Equal;
        };
        match self.direction {
            SortDirection::Asc => column.compare(a, b),
            SortDirection::Desc => column.compare(a, b).reverse(),
        }
    }

    /// Stable sort of task indices; ties keep their incoming order
    pub fn sort_indices(&self, tasks: &[Task], indices: &mut [usize]) {
        if self.column.is_none() {
            return;
        }
        indices.sort_by(|&a, &b| self.compare(&tasks[a], &tasks[b]));
    }
}

// ============================================================================
// Filter options
// ============================================================================

/// Department filter choices: normalized, deduplicated and sorted.
///
/// Placeholders and departments under an excluded prefix are left out.
pub fn department_options(tasks: &[Task], config: &PipelineConfig) -> Vec<String> {
    let excluded: Vec<String> = config
        .excluded_department_options
        .iter()
        .map(String::as_str)
        .map(fold_alef)
        .filter(|prefix| !prefix.is_empty())
        .collect();

    tasks
        .iter()
        .map(|task| normalize_department(&task.department))
        .filter(|name| !name.is_empty() && !config.markers.is_placeholder(name))
        .filter(|name| !excluded.iter().any(|prefix| name.contains(prefix.as_str())))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Responsible filter choices: every cleaned candidate name, deduplicated and sorted
pub fn responsible_options(tasks: &[Task], markers: &Markers) -> Vec<String> {
    tasks
        .iter()
        .flat_map(|task| split_responsible(&task.responsible, &markers.placeholder))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
