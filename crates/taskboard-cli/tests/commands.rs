//! E2E tests for the taskboard commands
//!
//! Each test ingests a small grid into its own store directory and drives the
//! binary through the dashboard, table and export commands.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

const GRID: &str = r#"[
  ["متابعة مهام الإدارة"],
  ["الموضوع/المهمة", "الإدارة", "المسؤول عن المهمه", "تاريخ  بدء المهمه",
   "التاريخ المتوقع لانهاء المهمة", "التاريخ الفعلي لانتهاء المهمة", "الحالة", "نسبة التقدم"],
  ["تطبيق معايير EFQM", "إدارة الجودة الشاملة", "د. محمد الطواله + علي حكمي", 45658, "2020-01-01", "-", "", null],
  ["خطة صرف الربع الرابع", "ادارة تميز الاعمال", "سعد البطي", 45658, "مستمرة", null, "التسليم اليوم", null],
  ["شهادة ISO 27001", "وحدة البحث والابتكار", "م. تركي الباتع / ابراهيم البدر", 45658, 45900, 45890, "", null],
  ["اجتماع الفريق", "", "-", 45658, 46000, null, "-", "40%"],
  [null, "ملاحظة ختامية"]
]"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn store(&self) -> PathBuf {
        self.path("store")
    }

    /// Write the sample grid and ingest it
    fn ingested() -> Self {
        let ws = Self::new();
        fs::write(ws.path("tasks.json"), GRID).unwrap();
        let (code, stdout, stderr) = ws.run(&["ingest", &ws.path("tasks.json").to_string_lossy()]);
        assert_eq!(code, 0, "ingest failed: {stderr}");
        assert!(stdout.contains("Loaded 4 tasks"), "unexpected output: {stdout}");
        ws
    }

    /// Run the binary against this workspace's store, returning (exit_code, stdout, stderr)
    fn run(&self, args: &[&str]) -> (i32, String, String) {
        run_in(&self.store(), args)
    }
}

fn taskboard_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_taskboard"))
}

fn run_in(store: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(taskboard_binary())
        .arg("--store")
        .arg(store)
        .arg("--today")
        .arg("2025-10-01")
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("TASKBOARD_CONFIG")
        .output()
        .expect("failed to execute taskboard");

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (exit_code, stdout, stderr)
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("output should be valid JSON")
}

// =============================================================================
// Ingest
// =============================================================================

#[test]
fn ingest_stores_snapshot() {
    let ws = Workspace::ingested();
    assert!(ws.store().join("processedData.json").exists());
}

#[test]
fn ingest_rejects_unsupported_extension() {
    let ws = Workspace::new();
    fs::write(ws.path("tasks.csv"), "a,b").unwrap();
    let (code, _, stderr) = ws.run(&["ingest", &ws.path("tasks.csv").to_string_lossy()]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Unsupported file type"), "stderr: {stderr}");
    assert!(!ws.store().join("processedData.json").exists());
}

#[test]
fn ingest_reports_missing_header_row() {
    let ws = Workspace::new();
    fs::write(ws.path("other.json"), r#"[["a", "b"], [1, 2]]"#).unwrap();
    let (code, _, stderr) = ws.run(&["ingest", &ws.path("other.json").to_string_lossy()]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Header row not found"), "stderr: {stderr}");
}

// =============================================================================
// Dashboard
// =============================================================================

#[test]
fn dashboard_without_data_says_so() {
    let ws = Workspace::new();
    let (code, _, stderr) = ws.run(&["dashboard"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("No data loaded"), "stderr: {stderr}");
}

#[test]
fn dashboard_text_shows_cards() {
    let ws = Workspace::ingested();
    let (code, stdout, _) = ws.run(&["dashboard"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("إجمالي المهام: 4"));
    assert!(stdout.contains("متأخر: 2 (50%)"));
    assert!(stdout.contains("غير محدد"));
}

#[test]
fn dashboard_json_has_summary_and_breakdown() {
    let ws = Workspace::ingested();
    let (code, stdout, _) = ws.run(&["dashboard", "--format", "json"]);
    assert_eq!(code, 0);

    let value = json(&stdout);
    assert_eq!(value["summary"]["totalTasks"], 4);
    assert_eq!(value["summary"]["completionRate"], 25);
    assert_eq!(value["cards"].as_array().map(Vec::len), Some(4));
    assert_eq!(value["departments"].as_array().map(Vec::len), Some(4));
    assert_eq!(value["preview"].as_array().map(Vec::len), Some(4));
}

// =============================================================================
// Table
// =============================================================================

#[test]
fn selected_status_applies_once() {
    let ws = Workspace::ingested();
    let (code, _, _) = ws.run(&["dashboard", "--select", "delayed"]);
    assert_eq!(code, 0);

    let (_, stdout, _) = ws.run(&["table", "--format", "json"]);
    assert_eq!(json(&stdout)["total"], 2);

    let (_, stdout, _) = ws.run(&["table", "--format", "json"]);
    assert_eq!(json(&stdout)["total"], 4);
}

#[test]
fn table_filters_and_sorts() {
    let ws = Workspace::ingested();
    let (code, stdout, _) = ws.run(&[
        "table",
        "--status",
        "delayed",
        "--sort",
        "subject",
        "--desc",
        "--format",
        "json",
    ]);
    assert_eq!(code, 0);

    let value = json(&stdout);
    let subjects: Vec<&str> = value["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["subject"].as_str().unwrap())
        .collect();
    assert_eq!(subjects, vec!["خطة صرف الربع الرابع", "تطبيق معايير EFQM"]);
}

#[test]
fn table_matches_responsible_by_substring() {
    let ws = Workspace::ingested();
    let (_, stdout, _) = ws.run(&["table", "--responsible", "البدر", "--format", "json"]);
    let value = json(&stdout);
    assert_eq!(value["total"], 1);
    assert_eq!(value["tasks"][0]["subject"], "شهادة ISO 27001");
}

#[test]
fn table_paginates() {
    let ws = Workspace::ingested();
    let (code, stdout, _) = ws.run(&["table", "--page-size", "10"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Showing 1-4 of 4"));
    assert!(stdout.contains("Page 1 of 1: [1]"));

    let (code, _, stderr) = ws.run(&["table", "--page-size", "7"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Invalid page size"));
}

#[test]
fn table_reports_empty_result() {
    let ws = Workspace::ingested();
    let (code, stdout, _) = ws.run(&["table", "--search", "لا يوجد"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("No tasks match"));
}

#[test]
fn table_rejects_unknown_sort_column() {
    let ws = Workspace::ingested();
    let (code, _, stderr) = ws.run(&["table", "--sort", "priority"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Unknown sort column"));
}

// =============================================================================
// Export
// =============================================================================

#[test]
fn export_xlsx_writes_workbook() {
    let ws = Workspace::ingested();
    let out = ws.path("delayed.xlsx");
    let (code, stdout, _) = ws.run(&[
        "export",
        "--status",
        "delayed",
        "-o",
        &out.to_string_lossy(),
    ]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Exported 2 tasks"));

    let bytes = fs::read(&out).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn export_json_holds_filtered_rows() {
    let ws = Workspace::ingested();
    let out = ws.path("completed.json");
    let (code, _, _) = ws.run(&[
        "export",
        "--status",
        "completed",
        "--format",
        "json",
        "-o",
        &out.to_string_lossy(),
    ]);
    assert_eq!(code, 0);

    let value = json(&fs::read_to_string(&out).unwrap());
    assert_eq!(value["tasks"].as_array().map(Vec::len), Some(1));
    assert_eq!(value["tasks"][0]["subject"], "شهادة ISO 27001");
    assert_eq!(value["headers"].as_array().map(Vec::len), Some(8));
}

#[test]
fn chart_renders_svg() {
    let ws = Workspace::ingested();
    let (code, stdout, _) = ws.run(&["chart"]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("<svg"));
    assert!(stdout.contains("وحدة البحث والابتكار"));
}

#[test]
fn config_file_overrides_defaults() {
    let ws = Workspace::new();
    fs::write(ws.path("tasks.json"), GRID).unwrap();
    fs::write(ws.path("taskboard.toml"), "delayed_progress = 0.1\n").unwrap();
    let config = ws.path("taskboard.toml");
    let config = config.to_string_lossy();

    let (code, _, stderr) = ws.run(&[
        "--config",
        &config,
        "ingest",
        &ws.path("tasks.json").to_string_lossy(),
    ]);
    assert_eq!(code, 0, "ingest failed: {stderr}");

    let (_, stdout, _) = ws.run(&["table", "--status", "delayed", "--format", "json"]);
    assert_eq!(json(&stdout)["tasks"][0]["progress"], 0.1);
}
