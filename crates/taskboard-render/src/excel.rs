//! Excel export of the visible table rows
//!
//! Writes exactly the rows held by the report, in order, under the report's
//! column set:
//!
//! ```text
//! Sheet: المهام (right-to-left)
//! | الموضوع/المهمة | الإدارة | ... | الحالة | نسبة التقدم |
//! |----------------|---------|-----|--------|-------------|
//! | تطبيق EFQM     | ...     | ... | مكتمل  | 100%        |
//!
//! Sheet: ملخص
//! | إجمالي المهام | 10 |
//! | مكتمل         | 4  | 40% |
//! ```
//!
//! Rows keep the dashboard highlight of their subject as a fill colour, and
//! status cells take the font colour of their badge.

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use taskboard_core::entity::collapse_whitespace;
use taskboard_core::{
    ColumnLabels, Highlight, Markers, RenderError, Renderer, Report, StatusLabel, Task,
};

const MAX_COLUMN_WIDTH: usize = 50;

/// XLSX exporter
#[derive(Clone, Debug)]
pub struct ExcelExporter {
    /// Name of the task sheet
    pub sheet_name: String,
    pub columns: ColumnLabels,
    pub markers: Markers,
    /// Lay sheets out right-to-left
    pub right_to_left: bool,
    /// Whether to add the summary sheet
    pub include_summary: bool,
    /// Report date written on the summary sheet
    pub as_of: Option<NaiveDate>,
}

impl Default for ExcelExporter {
    fn default() -> Self {
        Self {
            sheet_name: "المهام".into(),
            columns: ColumnLabels::default(),
            markers: Markers::default(),
            right_to_left: true,
            include_summary: true,
            as_of: None,
        }
    }
}

/// Text, percentage and status formats for one row fill
struct RowFormats {
    text: Format,
    percent: Format,
    /// Indexed like `StatusLabel::ALL`
    status: [Format; 3],
}

impl RowFormats {
    fn filled(color: Option<u32>) -> Self {
        let mut text = Format::new().set_border(FormatBorder::Thin);
        let mut percent = Format::new()
            .set_num_format("0%")
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin);
        if let Some(color) = color {
            text = text.set_background_color(color);
            percent = percent.set_background_color(color);
        }
        let status = StatusLabel::ALL.map(|label| {
            text.clone()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_font_color(badge_color(label))
        });
        Self {
            text,
            percent,
            status,
        }
    }

    fn status(&self, label: StatusLabel) -> &Format {
        match label {
            StatusLabel::Completed => &self.status[0],
            StatusLabel::Delayed => &self.status[1],
            StatusLabel::InProgress => &self.status[2],
        }
    }
}

fn badge_color(label: StatusLabel) -> u32 {
    match label {
        StatusLabel::Completed => 0x2E7D32,
        StatusLabel::Delayed => 0xC62828,
        StatusLabel::InProgress => 0xB26A00,
    }
}

struct ExportFormats {
    header: Format,
    plain: RowFormats,
    quality: RowFormats,
    spending: RowFormats,
    security: RowFormats,
    label: Format,
    number: Format,
    percent: Format,
}

impl ExportFormats {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_background_color(0x4472C4)
                .set_font_color(0xFFFFFF)
                .set_border(FormatBorder::Thin),
            plain: RowFormats::filled(None),
            quality: RowFormats::filled(Some(0xFFF2CC)),
            spending: RowFormats::filled(Some(0xFCE4D6)),
            security: RowFormats::filled(Some(0xDDEBF7)),
            label: Format::new().set_bold().set_border(FormatBorder::Thin),
            number: Format::new()
                .set_num_format("#,##0")
                .set_border(FormatBorder::Thin),
            percent: Format::new()
                .set_num_format("0%")
                .set_border(FormatBorder::Thin),
        }
    }

    fn row(&self, highlight: Option<Highlight>) -> &RowFormats {
        match highlight {
            None => &self.plain,
            Some(Highlight::Quality) => &self.quality,
            Some(Highlight::SpendingPlan) => &self.spending,
            Some(Highlight::Security) => &self.security,
        }
    }
}

/// How a column's cells are written
#[derive(Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Text,
    Status,
    Progress,
    Target,
}

impl ExcelExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    pub fn columns(mut self, columns: ColumnLabels) -> Self {
        self.columns = columns;
        self
    }

    pub fn markers(mut self, markers: Markers) -> Self {
        self.markers = markers;
        self
    }

    /// Keep the left-to-right sheet direction
    pub fn left_to_right(mut self) -> Self {
        self.right_to_left = false;
        self
    }

    /// Skip the summary sheet
    pub fn no_summary(mut self) -> Self {
        self.include_summary = false;
        self
    }

    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    fn column_kind(&self, header: &str) -> ColumnKind {
        let header = collapse_whitespace(header);
        if header == collapse_whitespace(&self.columns.status) {
            ColumnKind::Status
        } else if header == collapse_whitespace(&self.columns.progress) {
            ColumnKind::Progress
        } else if header == collapse_whitespace(&self.columns.target_percentage) {
            ColumnKind::Target
        } else {
            ColumnKind::Text
        }
    }

    /// Generate workbook bytes
    pub fn render_to_bytes(&self, report: &Report<'_>) -> Result<Vec<u8>, RenderError> {
        if report.headers.is_empty() {
            return Err(RenderError::InvalidData("No columns to export".into()));
        }

        let mut workbook = Workbook::new();
        let formats = ExportFormats::new();

        self.add_task_sheet(&mut workbook, report, &formats)?;
        if self.include_summary {
            self.add_summary_sheet(&mut workbook, report, &formats)?;
        }

        workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))
    }

    fn add_task_sheet(
        &self,
        workbook: &mut Workbook,
        report: &Report<'_>,
        formats: &ExportFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(&self.sheet_name)
            .map_err(|e| RenderError::Format(e.to_string()))?;
        sheet.set_right_to_left(self.right_to_left);

        let kinds: Vec<ColumnKind> = report.headers.iter().map(|h| self.column_kind(h)).collect();
        let mut widths: Vec<usize> = report.headers.iter().map(|h| h.chars().count()).collect();

        for (col, header) in report.headers.iter().enumerate() {
            sheet
                .write_with_format(0, col as u16, header.as_str(), &formats.header)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        for (index, task) in report.rows.iter().enumerate() {
            let row = index as u32 + 1;
            let row_formats = formats.row(task.highlight());
            for (col, header) in report.headers.iter().enumerate() {
                let col_index = col as u16;
                match (kinds[col], self.fraction(task, kinds[col])) {
                    (ColumnKind::Progress | ColumnKind::Target, Some(value)) => {
                        sheet
                            .write_with_format(row, col_index, value, &row_formats.percent)
                            .map_err(|e| RenderError::Format(e.to_string()))?;
                    }
                    (kind, _) => {
                        let value = task.value_for(header, &self.columns);
                        widths[col] = widths[col].max(value.chars().count());
                        let format = if kind == ColumnKind::Status {
                            row_formats.status(self.status_label(task))
                        } else {
                            &row_formats.text
                        };
                        write_text(sheet, row, col_index, &value, format)?;
                    }
                }
            }
        }

        for (col, width) in widths.iter().enumerate() {
            let width = (*width).clamp(8, MAX_COLUMN_WIDTH) + 2;
            sheet.set_column_width(col as u16, width as f64).ok();
        }
        sheet.set_freeze_panes(1, 0).ok();
        if !report.rows.is_empty() {
            sheet
                .autofilter(
                    0,
                    0,
                    report.rows.len() as u32,
                    (report.headers.len() - 1) as u16,
                )
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }
        Ok(())
    }

    fn fraction(&self, task: &Task, kind: ColumnKind) -> Option<f64> {
        match kind {
            ColumnKind::Progress => Some(task.progress),
            ColumnKind::Target => task.target_percentage,
            ColumnKind::Text | ColumnKind::Status => None,
        }
    }

    /// Badge category that colours the status cell
    fn status_label(&self, task: &Task) -> StatusLabel {
        StatusLabel::badge(task.status.text(), &self.markers)
    }

    fn add_summary_sheet(
        &self,
        workbook: &mut Workbook,
        report: &Report<'_>,
        formats: &ExportFormats,
    ) -> Result<(), RenderError> {
        let summary = report.summary;
        let sheet = workbook.add_worksheet();
        sheet
            .set_name("ملخص")
            .map_err(|e| RenderError::Format(e.to_string()))?;
        sheet.set_right_to_left(self.right_to_left);
        sheet.set_column_width(0, 28).ok();
        sheet.set_column_width(1, 12).ok();
        sheet.set_column_width(2, 12).ok();

        let mut row = 0u32;
        write_text(sheet, row, 0, "إجمالي المهام", &formats.label)?;
        write_number(sheet, row, 1, summary.total_tasks as f64, &formats.number)?;
        row += 1;

        write_text(sheet, row, 0, "المهام المصدّرة", &formats.label)?;
        write_number(sheet, row, 1, report.rows.len() as f64, &formats.number)?;
        row += 1;

        for label in StatusLabel::ALL {
            write_text(sheet, row, 0, label.as_str(), &formats.label)?;
            write_number(sheet, row, 1, summary.count(label) as f64, &formats.number)?;
            write_number(
                sheet,
                row,
                2,
                f64::from(summary.percentage(label)) / 100.0,
                &formats.percent,
            )?;
            row += 1;
        }

        write_text(sheet, row, 0, "نسبة الإنجاز", &formats.label)?;
        write_number(
            sheet,
            row,
            1,
            f64::from(summary.completion_rate) / 100.0,
            &formats.percent,
        )?;
        row += 1;

        if let Some(date) = self.as_of {
            write_text(sheet, row, 0, "تاريخ التقرير", &formats.label)?;
            write_text(sheet, row, 1, &date.format("%Y-%m-%d").to_string(), &formats.plain.text)?;
            row += 1;
        }

        if !report.department_counts.is_empty() {
            row += 1;
            write_text(sheet, row, 0, &self.columns.department, &formats.header)?;
            write_text(sheet, row, 1, "عدد المهام", &formats.header)?;
            for entry in &report.department_counts {
                row += 1;
                write_text(sheet, row, 0, &entry.name, &formats.plain.text)?;
                write_number(sheet, row, 1, entry.count as f64, &formats.number)?;
            }
        }

        Ok(())
    }
}

fn write_text(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &str,
    format: &Format,
) -> Result<(), RenderError> {
    sheet
        .write_with_format(row, col, value, format)
        .map_err(|e| RenderError::Format(e.to_string()))?;
    Ok(())
}

fn write_number(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: f64,
    format: &Format,
) -> Result<(), RenderError> {
    sheet
        .write_with_format(row, col, value, format)
        .map_err(|e| RenderError::Format(e.to_string()))?;
    Ok(())
}

impl Renderer for ExcelExporter {
    type Output = Vec<u8>;

    fn render(&self, report: &Report<'_>) -> Result<Vec<u8>, RenderError> {
        self.render_to_bytes(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use taskboard_core::{Status, Summary};

    #[test]
    fn progress_columns_are_numeric() {
        let exporter = ExcelExporter::new();
        assert!(exporter.column_kind("نسبة التقدم") == ColumnKind::Progress);
        assert!(exporter.column_kind("النسبة  المستهدفة") == ColumnKind::Target);
        assert!(exporter.column_kind("الحالة") == ColumnKind::Status);
        assert!(exporter.column_kind("الإدارة") == ColumnKind::Text);
    }

    #[test]
    fn status_colour_follows_configured_markers() {
        let task = Task::new("خطة صرف").with_status(Status::from_text("يسلم اليوم"));
        assert_eq!(ExcelExporter::new().status_label(&task), StatusLabel::InProgress);

        let markers = Markers {
            delivering_today: "يسلم اليوم".into(),
            ..Markers::default()
        };
        let exporter = ExcelExporter::new().markers(markers);
        assert_eq!(exporter.status_label(&task), StatusLabel::Delayed);

        let headers = vec!["الموضوع/المهمة".to_string(), "الحالة".to_string()];
        let summary = Summary::default();
        let report = Report::new(&headers, vec![&task], &summary);
        let bytes = exporter.render(&report).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn builder_options() {
        let exporter = ExcelExporter::new()
            .sheet_name("Tasks")
            .left_to_right()
            .no_summary();
        assert_eq!(exporter.sheet_name, "Tasks");
        assert!(!exporter.right_to_left);
        assert!(!exporter.include_summary);
    }

    #[test]
    fn empty_column_set_is_rejected() {
        let summary = Summary::default();
        let report = Report::new(&[], Vec::new(), &summary);
        assert!(matches!(
            ExcelExporter::new().render(&report),
            Err(RenderError::InvalidData(_))
        ));
    }
}
