//! Dataset summary (dashboard figures)
//!
//! A summary is always recomputed from the full task list in one pass. Status
//! counting uses substring checks so free-form statuses such as
//! "مكتمل جزئياً" still count; a status matching none of the three fragments
//! is counted in the total only.
//!
//! # Example
//!
//! ```rust
//! use taskboard_core::{EntityNormalizer, PipelineConfig, StatusLabel, Summary, Task};
//!
//! let normalizer = EntityNormalizer::new(&PipelineConfig::default());
//! let tasks = vec![
//!     Task::new("a").with_status(StatusLabel::Completed),
//!     Task::new("b").with_status(StatusLabel::Delayed),
//! ];
//!
//! let summary = Summary::from_tasks(&tasks, &normalizer);
//! assert_eq!(summary.completion_rate, 50);
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{EntityNormalizer, Markers, StatusLabel, Task};

/// Aggregated counts and recognised entities of a dataset
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub delayed_tasks: usize,
    pub in_progress_tasks: usize,
    /// Recognised departments, normalized and sorted
    pub departments: Vec<String>,
    /// Recognised people by canonical name, sorted
    pub responsible_persons: Vec<String>,
    /// Completed share of all tasks, rounded percent
    pub completion_rate: u32,
}

impl Summary {
    pub fn from_tasks(tasks: &[Task], normalizer: &EntityNormalizer) -> Self {
        let mut summary = Summary {
            total_tasks: tasks.len(),
            ..Summary::default()
        };
        let mut departments = BTreeSet::new();
        let mut people = BTreeSet::new();

        for task in tasks {
            match StatusLabel::classify(task.status.text()) {
                Some(StatusLabel::Completed) => summary.completed_tasks += 1,
                Some(StatusLabel::Delayed) => summary.delayed_tasks += 1,
                Some(StatusLabel::InProgress) => summary.in_progress_tasks += 1,
                None => {}
            }

            if let Some(department) = normalizer.recognized_department(&task.department) {
                departments.insert(department);
            }
            for person in normalizer.recognized_people(&task.responsible) {
                people.insert(person.to_string());
            }
        }

        summary.departments = departments.into_iter().collect();
        summary.responsible_persons = people.into_iter().collect();
        summary.completion_rate = percent(summary.completed_tasks, summary.total_tasks);
        summary
    }

    /// Number of tasks counted under `label`
    pub fn count(&self, label: StatusLabel) -> usize {
        match label {
            StatusLabel::Completed => self.completed_tasks,
            StatusLabel::Delayed => self.delayed_tasks,
            StatusLabel::InProgress => self.in_progress_tasks,
        }
    }

    /// Share of all tasks counted under `label`, rounded percent
    pub fn percentage(&self, label: StatusLabel) -> u32 {
        percent(self.count(label), self.total_tasks)
    }
}

/// `round(100 * part / total)`, 0 for an empty total
pub fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * part as f64 / total as f64).round() as u32
}

/// Task count of one department in the breakdown chart
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentCount {
    pub name: String,
    pub count: usize,
}

/// Tasks per department as written, in first-seen order.
///
/// Tasks without a department are grouped under the unassigned label.
pub fn department_breakdown(tasks: &[Task], markers: &Markers) -> Vec<DepartmentCount> {
    let mut counts: Vec<DepartmentCount> = Vec::new();
    for task in tasks {
        let name = match task.department.trim() {
            "" => markers.unassigned_department.as_str(),
            name => name,
        };
        match counts.iter_mut().find(|c| c.name == name) {
            Some(entry) => entry.count += 1,
            None => counts.push(DepartmentCount {
                name: name.to_string(),
                count: 1,
            }),
        }
    }
    counts
}
