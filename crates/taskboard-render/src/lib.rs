//! # taskboard-render
//!
//! Rendering backends for taskboard reports.
//!
//! This crate provides:
//! - Plain-text dashboard and table output for the console
//! - SVG charts: status distribution and tasks per department
//! - Excel export of exactly the rows a report holds
//! - JSON export of the same rows
//!
//! ## Example
//!
//! ```rust,ignore
//! use taskboard_core::Renderer;
//! use taskboard_render::{ExcelExporter, SvgChartRenderer, TableRenderer};
//!
//! let report = table_view.report();
//!
//! let text = TableRenderer::default().render(&report)?;
//! let svg = SvgChartRenderer::default().render(&report)?;
//! let xlsx_bytes = ExcelExporter::new().render(&report)?;
//! std::fs::write("tasks.xlsx", xlsx_bytes)?;
//! ```

pub mod chart;
pub mod excel;

pub use chart::SvgChartRenderer;
pub use excel::ExcelExporter;

use serde::Serialize;
use taskboard_core::{ColumnLabels, RenderError, Renderer, Report, StatusLabel, Task};

/// Truncate to at most `max` characters, ending with an ellipsis when cut
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Left-align `s` in a field `width` characters wide
fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    format!("{s}{}", " ".repeat(width.saturating_sub(len)))
}

// ============================================================================
// Dashboard
// ============================================================================

/// Console dashboard: status cards, completion rate, entity lists and preview
#[derive(Clone, Debug)]
pub struct TextRenderer {
    pub columns: ColumnLabels,
    /// Width of the completion progress bar in characters
    pub bar_width: usize,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            columns: ColumnLabels::default(),
            bar_width: 30,
        }
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: ColumnLabels) -> Self {
        self.columns = columns;
        self
    }

    fn progress_bar(&self, rate: u32) -> String {
        let filled = (self.bar_width * rate.min(100) as usize) / 100;
        format!(
            "[{}{}] {rate}%",
            "#".repeat(filled),
            "-".repeat(self.bar_width - filled)
        )
    }
}

impl Renderer for TextRenderer {
    type Output = String;

    fn render(&self, report: &Report<'_>) -> Result<String, RenderError> {
        let summary = report.summary;
        let mut out = String::new();

        out.push_str(&format!("إجمالي المهام: {}\n", summary.total_tasks));
        for label in StatusLabel::ALL {
            out.push_str(&format!(
                "{}: {} ({}%)\n",
                label,
                summary.count(label),
                summary.percentage(label)
            ));
        }
        out.push_str(&format!(
            "نسبة الإنجاز: {}\n",
            self.progress_bar(summary.completion_rate)
        ));

        if !summary.departments.is_empty() {
            out.push_str("\nالإدارات:\n");
            for department in &summary.departments {
                out.push_str(&format!("  - {department}\n"));
            }
        }
        if !summary.responsible_persons.is_empty() {
            out.push_str("\nالمسؤولون:\n");
            for person in &summary.responsible_persons {
                out.push_str(&format!("  - {person}\n"));
            }
        }

        if !report.department_counts.is_empty() {
            out.push_str("\nالمهام حسب الإدارة:\n");
            let width = report
                .department_counts
                .iter()
                .map(|d| d.name.chars().count())
                .max()
                .unwrap_or(0);
            for entry in &report.department_counts {
                out.push_str(&format!("  {} {}\n", pad(&entry.name, width), entry.count));
            }
        }

        if !report.rows.is_empty() {
            out.push('\n');
            let preview = TableRenderer {
                columns: self.columns.clone(),
                headers: Some(preview_headers(&self.columns)),
                ..TableRenderer::default()
            };
            out.push_str(&preview.render(report)?);
        }

        Ok(out)
    }
}

/// Columns of the dashboard preview table
fn preview_headers(columns: &ColumnLabels) -> Vec<String> {
    vec![
        columns.subject.clone(),
        columns.department.clone(),
        columns.responsible.clone(),
        columns.start_date.clone(),
        columns.expected_end_date.clone(),
        columns.status.clone(),
    ]
}

// ============================================================================
// Table
// ============================================================================

/// Console table of the report rows
#[derive(Clone, Debug)]
pub struct TableRenderer {
    pub columns: ColumnLabels,
    /// Column set to print; the report's headers when `None`
    pub headers: Option<Vec<String>>,
    /// Maximum characters per cell
    pub max_cell_width: usize,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self {
            columns: ColumnLabels::default(),
            headers: None,
            max_cell_width: 30,
        }
    }
}

impl TableRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: ColumnLabels) -> Self {
        self.columns = columns;
        self
    }

    pub fn headers(mut self, headers: Vec<String>) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn max_cell_width(mut self, width: usize) -> Self {
        self.max_cell_width = width.max(4);
        self
    }

    fn cells(&self, task: &Task, headers: &[String]) -> Vec<String> {
        headers
            .iter()
            .map(|h| truncate(&task.value_for(h, &self.columns), self.max_cell_width))
            .collect()
    }
}

impl Renderer for TableRenderer {
    type Output = String;

    fn render(&self, report: &Report<'_>) -> Result<String, RenderError> {
        let headers: &[String] = self.headers.as_deref().unwrap_or(report.headers);
        if headers.is_empty() {
            return Err(RenderError::InvalidData("No columns to render".into()));
        }

        let rows: Vec<Vec<String>> = report
            .rows
            .iter()
            .map(|task| self.cells(task, headers))
            .collect();
        let titles: Vec<String> = headers
            .iter()
            .map(|h| truncate(h.trim(), self.max_cell_width))
            .collect();

        let widths: Vec<usize> = (0..headers.len())
            .map(|col| {
                rows.iter()
                    .map(|row| row[col].chars().count())
                    .chain(std::iter::once(titles[col].chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| pad(cell, width))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let rule = widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-");
        let mut lines = vec![line(titles.as_slice()), rule];
        lines.extend(rows.iter().map(|row| line(row.as_slice())));

        let mut out = lines.join("\n");
        out.push('\n');
        Ok(out)
    }
}

// ============================================================================
// JSON export
// ============================================================================

#[derive(Serialize)]
struct JsonExport<'a> {
    headers: &'a [String],
    tasks: &'a [&'a Task],
}

/// JSON export of the report's column set and rows
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonExporter {
    pub pretty: bool,
}

impl JsonExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

impl Renderer for JsonExporter {
    type Output = String;

    fn render(&self, report: &Report<'_>) -> Result<String, RenderError> {
        let export = JsonExport {
            headers: report.headers,
            tasks: &report.rows,
        };
        let result = if self.pretty {
            serde_json::to_string_pretty(&export)
        } else {
            serde_json::to_string(&export)
        };
        result.map_err(|e| RenderError::Format(format!("Failed to write JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use taskboard_core::{DateValue, Summary};

    fn tasks() -> Vec<Task> {
        vec![
            Task::new("تطبيق معايير EFQM")
                .department("ادارة الجودة الشاملة")
                .expected_end(DateValue::from_text("2025-01-01"))
                .with_status(StatusLabel::Completed)
                .progress(1.0),
            Task::new("اجتماع").with_status(StatusLabel::InProgress).progress(0.5),
        ]
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("Short", 20), "Short");
        assert_eq!(truncate("This is a very long task name", 15), "This is a ve...");
        assert_eq!(truncate("الإدارة العامة للتميز المؤسسي", 10), "الإدارة...");
    }

    #[test]
    fn table_uses_report_headers() {
        let tasks = tasks();
        let headers = vec!["الموضوع/المهمة".to_string(), "نسبة التقدم".to_string()];
        let summary = Summary::default();
        let report = Report::new(&headers, tasks.iter().collect(), &summary);

        let out = TableRenderer::default().render(&report).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("الموضوع/المهمة"));
        assert!(lines[2].contains("100%"));
        assert!(lines[3].contains("50%"));
    }

    #[test]
    fn table_without_columns_is_invalid() {
        let summary = Summary::default();
        let report = Report::new(&[], Vec::new(), &summary);
        assert!(matches!(
            TableRenderer::default().render(&report),
            Err(RenderError::InvalidData(_))
        ));
    }

    #[test]
    fn dashboard_lists_cards_and_rate() {
        let tasks = tasks();
        let summary = Summary {
            total_tasks: 2,
            completed_tasks: 1,
            in_progress_tasks: 1,
            completion_rate: 50,
            departments: vec!["ادارة الجودة الشاملة".into()],
            ..Summary::default()
        };
        let report = Report::new(&[], tasks.iter().collect(), &summary);
        let out = TextRenderer::default().render(&report).unwrap();

        assert!(out.contains("إجمالي المهام: 2"));
        assert!(out.contains("مكتمل: 1 (50%)"));
        assert!(out.contains("متأخر: 0 (0%)"));
        assert!(out.contains("] 50%"));
        assert!(out.contains("  - ادارة الجودة الشاملة"));
        assert!(out.contains("2025-01-01"));
    }

    #[test]
    fn json_export_holds_rows_only() {
        let tasks = tasks();
        let headers = vec!["الموضوع/المهمة".to_string()];
        let summary = Summary::default();
        let report = Report::new(&headers, vec![&tasks[1]], &summary);

        let json = JsonExporter::new().render(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["tasks"].as_array().map(Vec::len), Some(1));
        assert_eq!(value["tasks"][0]["subject"], "اجتماع");
        assert_eq!(value["headers"][0], "الموضوع/المهمة");
    }
}
