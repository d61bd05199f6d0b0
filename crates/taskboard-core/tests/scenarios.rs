//! End-to-end runs: raw grid in, dashboard and table state out

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use taskboard_core::snapshot::{self, Snapshot};
use taskboard_core::{
    Cell, DashboardView, DateValue, FilterSpec, FixedClock, MemoryStore, Pipeline,
    PipelineConfig, SortColumn, Status, StatusLabel, TableView,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn header() -> Vec<Cell> {
    [
        "الموضوع/المهمة",
        "الإدارة",
        "المسؤول عن المهمه",
        "تاريخ  بدء المهمه",
        "التاريخ المتوقع لانهاء المهمة",
        "التاريخ الفعلي لانتهاء المهمة",
        "الحالة",
        "نسبة التقدم",
    ]
    .into_iter()
    .map(Cell::text)
    .collect()
}

fn task_row(
    subject: &str,
    department: &str,
    responsible: &str,
    expected: Cell,
    actual: Cell,
    status: &str,
) -> Vec<Cell> {
    vec![
        Cell::text(subject),
        Cell::text(department),
        Cell::text(responsible),
        Cell::Number(45658.0),
        expected,
        actual,
        Cell::text(status),
        Cell::Empty,
    ]
}

fn grid() -> Vec<Vec<Cell>> {
    vec![
        vec![Cell::text("متابعة مهام الإدارة")],
        header(),
        task_row(
            "تطبيق معايير EFQM",
            "إدارة الجودة الشاملة",
            "د. محمد الطواله + علي حكمي",
            Cell::text("2020-01-01"),
            Cell::text("-"),
            "",
        ),
        task_row(
            "خطة صرف الربع الرابع",
            "ادارة تميز الاعمال",
            "سعد البطي",
            Cell::text("مستمرة"),
            Cell::Empty,
            "التسليم اليوم",
        ),
        task_row(
            "شهادة ISO 27001",
            "وحدة البحث والابتكار",
            "م. تركي الباتع / ابراهيم البدر",
            Cell::Number(45900.0),
            Cell::Number(45890.0),
            "",
        ),
        task_row(
            "اجتماع الفريق",
            "",
            "-",
            Cell::Number(46000.0),
            Cell::Empty,
            "-",
        ),
        vec![Cell::Empty, Cell::text("ملاحظة ختامية")],
    ]
}

fn clock() -> FixedClock {
    FixedClock::new(date(2025, 10, 1))
}

#[test]
fn serial_dates_decode_in_pipeline() {
    let config = PipelineConfig::default();
    let clock = clock();
    let dataset = Pipeline::new(&config, &clock).run(&grid()).unwrap();
    assert_eq!(dataset.tasks[0].start_date, DateValue::Date(date(2025, 1, 1)));
}

#[test]
fn overdue_task_without_status_is_delayed() {
    let config = PipelineConfig::default();
    let clock = clock();
    let dataset = Pipeline::new(&config, &clock).run(&grid()).unwrap();

    let task = &dataset.tasks[0];
    assert_eq!(task.status, Status::Known(StatusLabel::Delayed));
    assert_eq!(task.progress, 0.25);
}

#[test]
fn every_task_is_resolved() {
    let config = PipelineConfig::default();
    let clock = clock();
    let dataset = Pipeline::new(&config, &clock).run(&grid()).unwrap();

    let statuses: Vec<&str> = dataset.tasks.iter().map(|t| t.status.text()).collect();
    assert_eq!(statuses, vec!["متأخر", "متأخر", "مكتمل", "جاري العمل"]);
    let progress: Vec<f64> = dataset.tasks.iter().map(|t| t.progress).collect();
    assert_eq!(progress, vec![0.25, 0.25, 1.0, 0.5]);
}

#[test]
fn summary_recognises_allow_listed_entities() {
    let config = PipelineConfig::default();
    let clock = clock();
    let pipeline = Pipeline::new(&config, &clock);
    let dataset = pipeline.run(&grid()).unwrap();
    let summary = dataset.summary(pipeline.normalizer());

    assert_eq!(summary.total_tasks, 4);
    assert_eq!(summary.completed_tasks, 1);
    assert_eq!(summary.delayed_tasks, 2);
    assert_eq!(summary.in_progress_tasks, 1);
    assert_eq!(summary.completion_rate, 25);
    assert_eq!(
        summary.departments,
        vec![
            "ادارة الجودة الشاملة",
            "ادارة تميز الاعمال",
            "وحدة البحث والابتكار",
        ]
    );
    assert_eq!(
        summary.responsible_persons,
        vec![
            "ابراهيم البدر",
            "تركي الباتع",
            "سعد البطي",
            "علي حكمي",
            "محمد الطواله",
        ]
    );
}

#[test]
fn upload_then_dashboard_then_table() {
    let config = PipelineConfig::default();
    let clock = clock();
    let pipeline = Pipeline::new(&config, &clock);
    let dataset = pipeline.run(&grid()).unwrap();

    let mut store = MemoryStore::new();
    let snapshot = Snapshot::from_dataset(dataset, pipeline.normalizer());
    snapshot::save(&mut store, &snapshot).unwrap();

    let dashboard = DashboardView::load(&store, config.clone())
        .unwrap()
        .ready()
        .unwrap();
    let departments: Vec<_> = dashboard
        .department_breakdown()
        .into_iter()
        .map(|d| (d.name, d.count))
        .collect();
    assert_eq!(
        departments,
        vec![
            ("ادارة الجودة الشاملة".to_string(), 1),
            ("ادارة تميز الاعمال".to_string(), 1),
            ("وحدة البحث والابتكار".to_string(), 1),
            ("غير محدد".to_string(), 1),
        ]
    );

    DashboardView::select_status(&mut store, Some(StatusLabel::Delayed)).unwrap();
    let mut table = TableView::load(&mut store, config).unwrap().ready().unwrap();
    assert_eq!(table.visible_count(), 2);

    table.click_sort(SortColumn::Subject);
    let subjects: Vec<_> = table.page_rows().iter().map(|t| t.subject.clone()).collect();
    assert_eq!(subjects, vec!["تطبيق معايير EFQM", "خطة صرف الربع الرابع"]);

    table.set_filter(FilterSpec {
        responsible: Some("البدر".into()),
        ..FilterSpec::default()
    });
    assert_eq!(table.visible_rows()[0].subject, "شهادة ISO 27001");
    assert_eq!(
        table.responsible_options(),
        vec![
            "ابراهيم البدر",
            "تركي الباتع",
            "سعد البطي",
            "علي حكمي",
            "محمد الطواله",
        ]
    );
}
