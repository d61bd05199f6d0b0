//! SVG dashboard charts: status distribution and tasks per department

use svg::node::element::{Group, Line, Rectangle, Text};
use svg::Document;
use taskboard_core::{RenderError, Renderer, Report, StatusLabel};

use crate::truncate;

/// SVG chart renderer configuration
#[derive(Clone, Debug)]
pub struct SvgChartRenderer {
    /// Width of the bar area in pixels
    pub chart_width: u32,
    /// Height per bar row in pixels
    pub row_height: u32,
    /// Width of the label column in pixels
    pub label_width: u32,
    /// Padding around the chart
    pub padding: u32,
    /// Bar colours for Completed, Delayed, InProgress
    pub completed_color: String,
    pub delayed_color: String,
    pub in_progress_color: String,
    /// Bar colour of the department chart
    pub department_color: String,
    pub background_color: String,
    pub grid_color: String,
    pub text_color: String,
    pub font_family: String,
    /// Font size in pixels
    pub font_size: u32,
}

impl Default for SvgChartRenderer {
    fn default() -> Self {
        Self {
            chart_width: 480,
            row_height: 30,
            label_width: 200,
            padding: 20,
            completed_color: "#27ae60".into(),
            delayed_color: "#e74c3c".into(),
            in_progress_color: "#f39c12".into(),
            department_color: "#3498db".into(),
            background_color: "#ffffff".into(),
            grid_color: "#ecf0f1".into(),
            text_color: "#2c3e50".into(),
            font_family: "Tahoma, system-ui, sans-serif".into(),
            font_size: 13,
        }
    }
}

/// One labelled bar
struct Bar<'a> {
    label: &'a str,
    value: usize,
    color: &'a str,
    caption: String,
}

impl SvgChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure chart width
    pub fn chart_width(mut self, width: u32) -> Self {
        self.chart_width = width;
        self
    }

    /// Configure row height
    pub fn row_height(mut self, height: u32) -> Self {
        self.row_height = height;
        self
    }

    fn status_color(&self, label: StatusLabel) -> &str {
        match label {
            StatusLabel::Completed => &self.completed_color,
            StatusLabel::Delayed => &self.delayed_color,
            StatusLabel::InProgress => &self.in_progress_color,
        }
    }

    fn total_width(&self) -> u32 {
        self.padding * 2 + self.label_width + self.chart_width
    }

    fn section_height(&self, bars: usize) -> u32 {
        // title row plus bars
        self.row_height * (bars as u32 + 1)
    }

    /// Title and horizontal bars scaled to the largest value
    fn render_section(&self, title: &str, bars: &[Bar<'_>], top: u32) -> Group {
        let mut group = Group::new().set("class", "section");

        let heading = Text::new(title)
            .set("x", self.padding)
            .set("y", top + self.row_height / 2 + 5)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size + 2)
            .set("font-weight", "bold")
            .set("fill", self.text_color.as_str());
        group = group.add(heading);

        let max = bars.iter().map(|b| b.value).max().unwrap_or(0).max(1) as f64;
        let bar_left = self.padding + self.label_width;
        let bar_height = (self.row_height as f64 * 0.6) as u32;

        for (i, bar) in bars.iter().enumerate() {
            let y = top + self.row_height * (i as u32 + 1);

            let grid = Line::new()
                .set("x1", self.padding)
                .set("y1", y + self.row_height)
                .set("x2", bar_left + self.chart_width)
                .set("y2", y + self.row_height)
                .set("stroke", self.grid_color.as_str())
                .set("stroke-width", 1);
            group = group.add(grid);

            let label = Text::new(truncate(bar.label, 28))
                .set("x", self.padding + 4)
                .set("y", y + self.row_height / 2 + 4)
                .set("font-family", self.font_family.as_str())
                .set("font-size", self.font_size)
                .set("fill", self.text_color.as_str());
            group = group.add(label);

            let width = (bar.value as f64 / max) * f64::from(self.chart_width - 60);
            let rect = Rectangle::new()
                .set("x", bar_left)
                .set("y", y + (self.row_height - bar_height) / 2)
                .set("width", width)
                .set("height", bar_height)
                .set("rx", 3)
                .set("ry", 3)
                .set("fill", bar.color);
            group = group.add(rect);

            let caption = Text::new(bar.caption.as_str())
                .set("x", bar_left as f64 + width + 6.0)
                .set("y", y + self.row_height / 2 + 4)
                .set("font-family", self.font_family.as_str())
                .set("font-size", self.font_size - 1)
                .set("fill", self.text_color.as_str());
            group = group.add(caption);
        }

        group
    }
}

impl Renderer for SvgChartRenderer {
    type Output = String;

    fn render(&self, report: &Report<'_>) -> Result<String, RenderError> {
        let summary = report.summary;
        if summary.total_tasks == 0 {
            return Err(RenderError::InvalidData("No tasks to chart".into()));
        }

        let status_bars: Vec<Bar<'_>> = StatusLabel::ALL
            .into_iter()
            .map(|label| Bar {
                label: label.as_str(),
                value: summary.count(label),
                color: self.status_color(label),
                caption: format!("{} ({}%)", summary.count(label), summary.percentage(label)),
            })
            .collect();

        let department_bars: Vec<Bar<'_>> = report
            .department_counts
            .iter()
            .map(|entry| Bar {
                label: &entry.name,
                value: entry.count,
                color: &self.department_color,
                caption: entry.count.to_string(),
            })
            .collect();

        let mut height = self.padding * 2 + self.section_height(status_bars.len());
        if !department_bars.is_empty() {
            height += self.section_height(department_bars.len()) + self.row_height / 2;
        }
        let width = self.total_width();

        let mut document = Document::new()
            .set("width", width)
            .set("height", height)
            .set("viewBox", (0, 0, width, height))
            .set("xmlns", "http://www.w3.org/2000/svg");

        let background = Rectangle::new()
            .set("width", "100%")
            .set("height", "100%")
            .set("fill", self.background_color.as_str());
        document = document.add(background);

        let mut top = self.padding;
        document = document.add(self.render_section("توزيع حالات المهام", &status_bars, top));
        top += self.section_height(status_bars.len()) + self.row_height / 2;

        if !department_bars.is_empty() {
            document = document.add(self.render_section("المهام حسب الإدارة", &department_bars, top));
        }

        let mut output = Vec::new();
        svg::write(&mut output, &document)
            .map_err(|e| RenderError::Format(format!("Failed to write SVG: {}", e)))?;

        String::from_utf8(output).map_err(|e| RenderError::Format(format!("Invalid UTF-8: {}", e)))
    }
}
