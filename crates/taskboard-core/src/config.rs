//! Hand-maintained configuration: column labels, marker phrases and allow-lists.
//!
//! Every field has a default matching the organisation's current spreadsheet,
//! so a TOML override only needs the keys that differ:
//!
//! ```toml
//! delayed_progress = 0.25
//! people = ["ابراهيم البدر", "محمد الطواله"]
//!
//! [markers]
//! ongoing = "مستمرة"
//! ```

use serde::{Deserialize, Serialize};

/// Default progress for a Delayed task that carries no explicit progress
pub const DEFAULT_DELAYED_PROGRESS: f64 = 0.25;

/// Settings shared by the upload, dashboard and table views
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub columns: ColumnLabels,
    pub markers: Markers,
    /// Recognised departments
    pub departments: Vec<String>,
    /// Recognised responsible people, full names
    pub people: Vec<String>,
    /// Department prefixes left out of the table's department filter options
    pub excluded_department_options: Vec<String>,
    /// Progress assigned to Delayed tasks without an explicit value
    pub delayed_progress: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            columns: ColumnLabels::default(),
            markers: Markers::default(),
            departments: [
                "الإدارة العامة للتميز المؤسسي",
                "إدارة الجودة الشاملة",
                "ادارة تميز الاعمال",
                "وحدة البحث والابتكار",
            ]
            .map(String::from)
            .to_vec(),
            people: [
                "ابراهيم البدر",
                "محمد الطواله",
                "علي حكمي",
                "عبداللطيف الهمشي",
                "تركي الباتع",
                "سعد البطي",
            ]
            .map(String::from)
            .to_vec(),
            excluded_department_options: vec!["الادارة العامة للتميز".into()],
            delayed_progress: DEFAULT_DELAYED_PROGRESS,
        }
    }
}

/// Header labels of the source sheet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLabels {
    /// Also marks the header row: it is the first row starting with this label
    pub subject: String,
    pub department: String,
    pub responsible: String,
    pub start_date: String,
    pub expected_end_date: String,
    pub actual_end_date: String,
    pub status: String,
    pub progress: String,
    pub target_percentage: String,
    pub notes: String,
}

impl Default for ColumnLabels {
    fn default() -> Self {
        Self {
            subject: "الموضوع/المهمة".into(),
            department: "الإدارة".into(),
            responsible: "المسؤول عن المهمه".into(),
            start_date: "تاريخ  بدء المهمه".into(),
            expected_end_date: "التاريخ المتوقع لانهاء المهمة".into(),
            actual_end_date: "التاريخ الفعلي لانتهاء المهمة".into(),
            status: "الحالة".into(),
            progress: "نسبة التقدم".into(),
            target_percentage: "النسبة المستهدفة".into(),
            notes: "ملاحظات (ان وجدت)".into(),
        }
    }
}

/// Literal phrases with special meaning in status and date cells
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
    /// Stands in for an end date on open-ended work
    pub ongoing: String,
    /// Status phrase always read as a delay
    pub delivering_today: String,
    /// Explicit "no value" cell content
    pub placeholder: String,
    /// Department label for tasks without one in the department breakdown
    pub unassigned_department: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            ongoing: "مستمرة".into(),
            delivering_today: "التسليم اليوم".into(),
            placeholder: "-".into(),
            unassigned_department: "غير محدد".into(),
        }
    }
}

impl Markers {
    pub fn is_placeholder(&self, s: &str) -> bool {
        s.trim() == self.placeholder
    }

    pub fn is_ongoing(&self, s: &str) -> bool {
        !self.ongoing.is_empty() && s.trim() == self.ongoing
    }

    pub fn is_delivering_today(&self, s: &str) -> bool {
        !self.delivering_today.is_empty() && s.contains(&self.delivering_today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_allow_lists() {
        let config = PipelineConfig::default();
        assert_eq!(config.departments.len(), 4);
        assert_eq!(config.people.len(), 6);
        assert_eq!(config.delayed_progress, 0.25);
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"delayed_progress": 0.0, "markers": {"ongoing": "ongoing"}}"#)
                .unwrap();
        assert_eq!(config.delayed_progress, 0.0);
        assert_eq!(config.markers.ongoing, "ongoing");
        assert_eq!(config.markers.placeholder, "-");
        assert_eq!(config.people.len(), 6);
    }

    #[test]
    fn empty_markers_never_match() {
        let markers = Markers {
            delivering_today: String::new(),
            ongoing: String::new(),
            ..Markers::default()
        };
        assert!(!markers.is_delivering_today("anything"));
        assert!(!markers.is_ongoing(""));
    }
}
