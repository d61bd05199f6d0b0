//! Export of filtered table views

use pretty_assertions::assert_eq;
use taskboard_core::{
    Dataset, DateValue, FilterSpec, PipelineConfig, Renderer, StatusLabel, TableView, Task,
    DashboardView,
};
use taskboard_render::{ExcelExporter, JsonExporter, SvgChartRenderer, TableRenderer, TextRenderer};

fn dataset() -> Dataset {
    let headers = vec![
        "الموضوع/المهمة".to_string(),
        "الإدارة".to_string(),
        "الحالة".to_string(),
        "نسبة التقدم".to_string(),
        "الأولوية".to_string(),
    ];
    let mut urgent = Task::new("شهادة ISO 27001")
        .department("وحدة البحث والابتكار")
        .expected_end(DateValue::from_text("2025-03-01"))
        .with_status(StatusLabel::Delayed)
        .progress(0.25);
    urgent.extra.insert("الأولوية".into(), "عالية".into());

    let tasks = vec![
        Task::new("تطبيق معايير EFQM")
            .department("ادارة الجودة الشاملة")
            .with_status(StatusLabel::Completed)
            .progress(1.0),
        urgent,
        Task::new("خطة صرف الربع الرابع")
            .with_status(StatusLabel::InProgress)
            .progress(0.5),
    ];
    Dataset::new(headers, tasks)
}

fn delayed_table() -> TableView {
    let mut table = TableView::from_dataset(dataset(), PipelineConfig::default());
    table.set_filter(FilterSpec {
        status: Some(StatusLabel::Delayed),
        ..FilterSpec::default()
    });
    table
}

#[test]
fn excel_export_produces_workbook() {
    let table = delayed_table();
    let bytes = ExcelExporter::new().render(&table.report()).unwrap();
    assert!(bytes.len() > 100);
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn excel_export_of_empty_filter_still_has_headers() {
    let mut table = TableView::from_dataset(dataset(), PipelineConfig::default());
    table.set_filter(FilterSpec {
        search: "لا يوجد".into(),
        ..FilterSpec::default()
    });
    assert_eq!(table.visible_count(), 0);
    let bytes = ExcelExporter::new().no_summary().render(&table.report()).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn json_export_matches_visible_rows() {
    let table = delayed_table();
    let json = JsonExporter::new().pretty().render(&table.report()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let tasks = value["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["subject"], "شهادة ISO 27001");
    assert_eq!(tasks[0]["extra"]["الأولوية"], "عالية");
    assert_eq!(value["headers"].as_array().unwrap().len(), 5);
}

#[test]
fn table_text_keeps_column_set() {
    let table = delayed_table();
    let out = TableRenderer::default().render(&table.report()).unwrap();
    let header = out.lines().next().unwrap();
    assert!(header.contains("الأولوية"));
    assert!(out.contains("عالية"));
    assert!(out.contains("25%"));
    assert!(!out.contains("EFQM"));
}

#[test]
fn dashboard_outputs() {
    let dashboard = DashboardView::from_dataset(dataset(), PipelineConfig::default());
    let report = dashboard.report();

    let text = TextRenderer::default().render(&report).unwrap();
    assert!(text.contains("إجمالي المهام: 3"));
    assert!(text.contains("غير محدد"));

    let svg = SvgChartRenderer::default().render(&report).unwrap();
    assert!(svg.contains("وحدة البحث والابتكار"));
}
