//! WebAssembly bindings for the taskboard dashboard engine
//!
//! The browser reads the uploaded workbook into a row-major grid and hands it
//! over as JSON. A [`Board`] normalizes it, keeps the snapshot, and serves the
//! dashboard, the table and the exports. Persisting the snapshot between page
//! loads is left to the host: it reads [`Board::snapshot_json`] after an upload
//! and passes it back through [`Board::restore`].

use chrono::NaiveDate;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use taskboard_core::snapshot::{self, Snapshot, DATASET_KEY, STATUS_FILTER_KEY};
use taskboard_core::{
    Clock, DashboardView, DepartmentCount, FilterSpec, FixedClock, MemoryStore, PageSize,
    Pipeline, PipelineConfig, Renderer, SnapshotStore, SortColumn, SortDirection, StatusCard,
    StatusLabel, Summary, SystemClock, TableView, Task, ViewData,
};
use taskboard_render::{ExcelExporter, JsonExporter, SvgChartRenderer};

/// Initialize panic hook for better error messages in console
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

// ============================================================================
// Result types
// ============================================================================

#[derive(Serialize)]
struct UploadResult {
    success: bool,
    error: Option<String>,
    summary: Option<Summary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardData<'a> {
    ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a Summary>,
    cards: Vec<StatusCard>,
    departments: Vec<DepartmentCount>,
    preview: Vec<RowData<'a>>,
}

/// Task plus the presentation hints of its table row
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RowData<'a> {
    #[serde(flatten)]
    task: &'a Task,
    badge: StatusLabel,
    highlight: Option<&'static str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TablePage<'a> {
    page: usize,
    page_count: usize,
    /// Page links around the current page
    pages: Vec<usize>,
    first: usize,
    last: usize,
    total: usize,
    headers: &'a [String],
    rows: Vec<RowData<'a>>,
    filter: &'a FilterSpec,
    sort_column: Option<SortColumn>,
    sort_direction: SortDirection,
}

#[derive(Serialize)]
struct FilterOptions {
    departments: Vec<String>,
    responsible: Vec<String>,
}

// ============================================================================
// Board
// ============================================================================

/// Upload, dashboard and table session for one browser page
#[wasm_bindgen]
pub struct Board {
    config: PipelineConfig,
    store: MemoryStore,
    /// Reference date; the host's local date when unset
    today: Option<NaiveDate>,
    table: Option<TableView>,
    last_error: Option<String>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Board {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            store: MemoryStore::new(),
            today: None,
            table: None,
            last_error: None,
        }
    }

    /// Replace the configuration from a JS object; unknown keys are ignored
    pub fn set_config(&mut self, config: JsValue) -> bool {
        match serde_wasm_bindgen::from_value::<PipelineConfig>(config) {
            Ok(config) => {
                self.config = config;
                true
            }
            Err(e) => self.fail(format!("Invalid config: {e}")),
        }
    }

    /// Replace the configuration from a JSON string
    pub fn set_config_json(&mut self, json: &str) -> bool {
        match serde_json::from_str::<PipelineConfig>(json) {
            Ok(config) => {
                self.config = config;
                true
            }
            Err(e) => self.fail(format!("Invalid config: {e}")),
        }
    }

    /// Pin the reference date (`YYYY-MM-DD`); an empty string restores the host date
    pub fn set_today(&mut self, date: &str) -> bool {
        if date.trim().is_empty() {
            self.today = None;
            return true;
        }
        match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
            Ok(date) => {
                self.today = Some(date);
                true
            }
            Err(e) => self.fail(format!("Invalid date '{date}': {e}")),
        }
    }

    // =========================================================================
    // Upload
    // =========================================================================

    /// Normalize an uploaded grid and make it the current dataset
    ///
    /// # Arguments
    /// * `file_name` - Name of the uploaded file, used to check its type
    /// * `grid_json` - The sheet as a JSON array of rows
    ///
    /// # Returns
    /// JSON object `{ success, error, summary }`
    pub fn upload(&mut self, file_name: &str, grid_json: &str) -> String {
        let result = match self.upload_internal(file_name, grid_json) {
            Ok(summary) => UploadResult {
                success: true,
                error: None,
                summary: Some(summary),
            },
            Err(e) => {
                self.last_error = Some(e.clone());
                UploadResult {
                    success: false,
                    error: Some(e),
                    summary: None,
                }
            }
        };
        serde_json::to_string(&result).unwrap_or_default()
    }

    /// The stored snapshot, or an empty string before any upload
    pub fn snapshot_json(&self) -> String {
        self.store.get(DATASET_KEY).ok().flatten().unwrap_or_default()
    }

    /// Reinstate a snapshot saved by the host
    pub fn restore(&mut self, snapshot_json: &str) -> bool {
        let stored = Snapshot::from_json(snapshot_json)
            .and_then(|snapshot| snapshot::save(&mut self.store, &snapshot));
        match stored {
            Ok(()) => {
                self.table = None;
                true
            }
            Err(e) => self.fail(e.to_string()),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.snapshot_json().is_empty()
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Dashboard data as JSON; `ready` is false before any upload
    pub fn dashboard(&mut self) -> String {
        let view = match DashboardView::load(&self.store, self.config.clone()) {
            Ok(ViewData::Ready(view)) => view,
            Ok(ViewData::NoData) => return not_ready(),
            Err(e) => {
                self.fail(e.to_string());
                return not_ready();
            }
        };
        let data = DashboardData {
            ready: true,
            summary: Some(view.summary()),
            cards: view.status_cards(),
            departments: view.department_breakdown(),
            preview: view.preview().iter().map(|t| self.row(t)).collect(),
        };
        serde_json::to_string(&data).unwrap_or_default()
    }

    /// Status and department charts as SVG, empty before any upload
    pub fn render_chart_svg(&mut self) -> String {
        match DashboardView::load(&self.store, self.config.clone()) {
            Ok(ViewData::Ready(view)) => match SvgChartRenderer::new().render(&view.report()) {
                Ok(svg) => svg,
                Err(e) => {
                    self.fail(e.to_string());
                    String::new()
                }
            },
            Ok(ViewData::NoData) => String::new(),
            Err(e) => {
                self.fail(e.to_string());
                String::new()
            }
        }
    }

    /// Status card click: `completed`, `delayed`, `in-progress`, or `total` to clear
    pub fn select_status(&mut self, key: &str) -> bool {
        let status = if key == "total" {
            None
        } else {
            match StatusLabel::from_key(key) {
                Some(label) => Some(label),
                None => return self.fail(format!("Unknown status '{key}'")),
            }
        };
        match DashboardView::select_status(&mut self.store, status) {
            Ok(()) => true,
            Err(e) => self.fail(e.to_string()),
        }
    }

    /// Pending status selection, for hosts that navigate between pages
    pub fn status_marker(&self) -> Option<String> {
        self.store.get(STATUS_FILTER_KEY).ok().flatten()
    }

    // =========================================================================
    // Table
    // =========================================================================

    /// Build the table view, applying and clearing any pending status selection
    pub fn open_table(&mut self) -> bool {
        match TableView::load(&mut self.store, self.config.clone()) {
            Ok(ViewData::Ready(view)) => {
                self.table = Some(view);
                true
            }
            Ok(ViewData::NoData) => {
                self.table = None;
                false
            }
            Err(e) => {
                self.table = None;
                self.fail(e.to_string())
            }
        }
    }

    /// Replace the filter from a JSON object (see `FilterSpec`)
    pub fn set_filter(&mut self, filter_json: &str) -> bool {
        let filter = match serde_json::from_str::<FilterSpec>(filter_json) {
            Ok(filter) => filter,
            Err(e) => return self.fail(format!("Invalid filter: {e}")),
        };
        match self.table.as_mut() {
            Some(table) => {
                table.set_filter(filter);
                true
            }
            None => self.fail(NO_TABLE.to_string()),
        }
    }

    pub fn clear_filters(&mut self) {
        if let Some(table) = self.table.as_mut() {
            table.clear_filters();
        }
    }

    /// Search keystroke at `now_ms` (host clock, milliseconds)
    pub fn queue_search(&mut self, text: &str, now_ms: f64) {
        if let Some(table) = self.table.as_mut() {
            table.queue_search(text, now_ms as u64);
        }
    }

    /// Apply a settled search; true when the rows changed
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.table
            .as_mut()
            .map_or(false, |table| table.tick(now_ms as u64))
    }

    /// Column header click by column key
    pub fn click_sort(&mut self, column: &str) -> bool {
        let Some(column) = SortColumn::from_key(column) else {
            return self.fail(format!("Unknown column '{column}'"));
        };
        match self.table.as_mut() {
            Some(table) => {
                table.click_sort(column);
                true
            }
            None => self.fail(NO_TABLE.to_string()),
        }
    }

    /// `"10"`, `"25"`, `"50"`, `"100"` or `"all"`
    pub fn set_page_size(&mut self, size: &str) -> bool {
        let Some(size) = PageSize::parse(size) else {
            return self.fail(format!("Invalid page size '{size}'"));
        };
        match self.table.as_mut() {
            Some(table) => {
                table.set_page_size(size);
                true
            }
            None => self.fail(NO_TABLE.to_string()),
        }
    }

    /// Move to `page`; false when it does not exist
    pub fn go_to_page(&mut self, page: usize) -> bool {
        match self.table.as_mut() {
            Some(table) => table.go_to_page(page),
            None => self.fail(NO_TABLE.to_string()),
        }
    }

    /// Current page as JSON, empty string when the table is not open
    pub fn table_page(&self) -> String {
        let Some(table) = &self.table else {
            return String::new();
        };
        let pagination = table.pagination();
        let total = table.visible_count();
        let (first, last, _) = table.results_info();
        let sort = table.sort();
        let page = TablePage {
            page: pagination.page(),
            page_count: pagination.page_count(total),
            pages: pagination.window(total).collect(),
            first,
            last,
            total,
            headers: &table.dataset().headers,
            rows: table.page_rows().into_iter().map(|t| self.row(t)).collect(),
            filter: table.filter(),
            sort_column: sort.column,
            sort_direction: sort.direction,
        };
        serde_json::to_string(&page).unwrap_or_default()
    }

    /// Department and responsible filter options as JSON
    pub fn filter_options(&self) -> String {
        let Some(table) = &self.table else {
            return String::new();
        };
        let options = FilterOptions {
            departments: table.department_options(),
            responsible: table.responsible_options(),
        };
        serde_json::to_string(&options).unwrap_or_default()
    }

    /// Every row passing the filter as an XLSX workbook, empty when the table is not open
    pub fn export_xlsx(&mut self) -> Vec<u8> {
        let Some(table) = &self.table else {
            return Vec::new();
        };
        let mut exporter = ExcelExporter::new()
            .columns(self.config.columns.clone())
            .markers(self.config.markers.clone());
        if let Some(date) = self.today {
            exporter = exporter.as_of(date);
        }
        let rendered = exporter.render(&table.report());
        match rendered {
            Ok(bytes) => bytes,
            Err(e) => {
                self.fail(e.to_string());
                Vec::new()
            }
        }
    }

    /// Every row passing the filter as JSON, empty when the table is not open
    pub fn export_json(&mut self) -> String {
        let Some(table) = &self.table else {
            return String::new();
        };
        let rendered = JsonExporter::new().render(&table.report());
        match rendered {
            Ok(json) => json,
            Err(e) => {
                self.fail(e.to_string());
                String::new()
            }
        }
    }

    /// Get the last error message
    pub fn get_last_error(&self) -> Option<String> {
        self.last_error.clone()
    }
}

impl Board {
    fn upload_internal(&mut self, file_name: &str, grid_json: &str) -> Result<Summary, String> {
        let clock: Box<dyn Clock> = match self.today {
            Some(date) => Box::new(FixedClock::new(date)),
            None => Box::new(SystemClock),
        };
        let pipeline = Pipeline::new(&self.config, clock.as_ref());
        let dataset = pipeline
            .ingest_grid(file_name, grid_json)
            .map_err(|e| e.to_string())?;
        let snapshot = Snapshot::from_dataset(dataset, pipeline.normalizer());
        snapshot::save(&mut self.store, &snapshot).map_err(|e| e.to_string())?;
        self.table = None;
        Ok(snapshot.summary)
    }

    fn row<'a>(&self, task: &'a Task) -> RowData<'a> {
        RowData {
            task,
            badge: StatusLabel::badge(task.status.text(), &self.config.markers),
            highlight: task.highlight().map(|h| h.css_class()),
        }
    }

    fn fail(&mut self, message: String) -> bool {
        self.last_error = Some(message);
        false
    }
}

const NO_TABLE: &str = "No table open; call open_table first";

fn not_ready() -> String {
    r#"{"ready":false,"cards":[],"departments":[],"preview":[]}"#.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    const GRID: &str = r#"[
      ["الموضوع/المهمة", "الإدارة", "المسؤول عن المهمه", "التاريخ المتوقع لانهاء المهمة", "الحالة"],
      ["تطبيق معايير EFQM", "إدارة الجودة الشاملة", "محمد الطواله", "2020-01-01", ""],
      ["خطة صرف 2025", "ادارة تميز الاعمال", "سعد البطي", "2030-01-01", ""],
      ["اعتماد السياسة", "وحدة البحث والابتكار", "علي حكمي", "2024-05-01", "مكتمل"]
    ]"#;

    fn board() -> Board {
        let mut board = Board::new();
        assert!(board.set_today("2025-10-01"));
        let result: Value = serde_json::from_str(&board.upload("tasks.json", GRID)).unwrap();
        assert_eq!(result["success"], true);
        board
    }

    fn page(board: &Board) -> Value {
        serde_json::from_str(&board.table_page()).unwrap()
    }

    #[test]
    fn upload_returns_summary() {
        let mut board = Board::new();
        board.set_today("2025-10-01");
        let result: Value = serde_json::from_str(&board.upload("tasks.json", GRID)).unwrap();
        assert_eq!(result["summary"]["totalTasks"], 3);
        assert_eq!(result["summary"]["delayedTasks"], 1);
        assert_eq!(result["summary"]["completionRate"], 33);
        assert!(board.has_data());
    }

    #[test]
    fn upload_rejects_other_file_types() {
        let mut board = Board::new();
        let result: Value = serde_json::from_str(&board.upload("tasks.csv", GRID)).unwrap();
        assert_eq!(result["success"], false);
        assert!(board.get_last_error().unwrap().contains("Unsupported file type"));
        assert!(!board.has_data());
    }

    #[test]
    fn workbook_uploads_are_accepted() {
        let mut board = Board::new();
        board.set_today("2025-10-01");
        let result: Value = serde_json::from_str(&board.upload("tasks.xlsx", GRID)).unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(result["summary"]["totalTasks"], 3);
        assert_eq!(board.get_last_error(), None);

        let result: Value = serde_json::from_str(&board.upload("Tasks.XLS", GRID)).unwrap();
        assert_eq!(result["success"], true);
    }

    #[test]
    fn table_calls_without_open_table_report_an_error() {
        let mut board = board();
        assert!(!board.set_filter(r#"{"search": "efqm"}"#));
        assert!(board.get_last_error().unwrap().contains("No table open"));

        let mut board = Board::new();
        assert!(!board.click_sort("subject"));
        assert!(board.get_last_error().unwrap().contains("No table open"));
        assert!(!board.set_page_size("10"));
        assert!(!board.go_to_page(1));
        assert_eq!(board.export_json(), "");
    }

    #[test]
    fn chart_of_empty_upload_reports_an_error() {
        let mut board = Board::new();
        board.set_today("2025-10-01");
        let header_only = r#"[["الموضوع/المهمة", "الإدارة", "الحالة"]]"#;
        let result: Value = serde_json::from_str(&board.upload("tasks.json", header_only)).unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(board.get_last_error(), None);

        assert_eq!(board.render_chart_svg(), "");
        assert!(board.get_last_error().unwrap().contains("No tasks to chart"));
    }

    #[test]
    fn dashboard_before_upload_is_not_ready() {
        let mut board = Board::new();
        let data: Value = serde_json::from_str(&board.dashboard()).unwrap();
        assert_eq!(data["ready"], false);
        assert!(!board.open_table());
        assert_eq!(board.table_page(), "");
    }

    #[test]
    fn dashboard_rows_carry_badges_and_highlights() {
        let mut board = board();
        let data: Value = serde_json::from_str(&board.dashboard()).unwrap();
        assert_eq!(data["ready"], true);
        assert_eq!(data["cards"][0]["count"], 3);
        assert_eq!(data["preview"][0]["badge"], "delayed");
        assert_eq!(data["preview"][0]["highlight"], "highlight-yellow");
        assert_eq!(data["preview"][1]["highlight"], "highlight-orange");
        assert!(board.render_chart_svg().starts_with("<svg"));
    }

    #[test]
    fn status_selection_reaches_table_once() {
        let mut board = board();
        assert!(board.select_status("completed"));
        assert_eq!(board.status_marker().as_deref(), Some("completed"));

        assert!(board.open_table());
        assert_eq!(page(&board)["total"], 1);
        assert_eq!(board.status_marker(), None);

        assert!(board.open_table());
        assert_eq!(page(&board)["total"], 3);
    }

    #[test]
    fn table_search_is_debounced() {
        let mut board = board();
        board.open_table();
        board.queue_search("efqm", 1_000.0);
        assert!(!board.tick(1_100.0));
        assert_eq!(page(&board)["total"], 3);
        assert!(board.tick(1_300.0));
        assert_eq!(page(&board)["total"], 1);
    }

    #[test]
    fn table_sort_and_filter() {
        let mut board = board();
        board.open_table();
        assert!(board.click_sort("expected-end-date"));
        assert!(board.click_sort("expected-end-date"));
        let value = page(&board);
        assert_eq!(value["sortDirection"], "desc");
        assert_eq!(value["rows"][0]["subject"], "خطة صرف 2025");

        assert!(board.set_filter(r#"{"department": "ادارة الجودة الشاملة"}"#));
        assert_eq!(page(&board)["total"], 1);
        assert!(!board.click_sort("priority"));
    }

    #[test]
    fn filter_form_with_blank_fields_applies() {
        let mut board = board();
        board.open_table();
        assert!(board.set_filter(r#"{"search": "efqm", "startFrom": "", "startTo": "", "status": ""}"#));
        assert_eq!(page(&board)["total"], 1);
        assert_eq!(board.get_last_error(), None);

        assert!(board.set_filter(r#"{"status": ""}"#));
        assert_eq!(page(&board)["total"], 3);
        assert_eq!(page(&board)["filter"]["status"], Value::Null);
    }

    #[test]
    fn exports_follow_filter() {
        let mut board = board();
        board.open_table();
        board.set_filter(r#"{"status": "delayed"}"#);
        let bytes = board.export_xlsx();
        assert_eq!(&bytes[..2], b"PK");
        let json: Value = serde_json::from_str(&board.export_json()).unwrap();
        assert_eq!(json["tasks"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn snapshot_survives_restore() {
        let source = board();
        let saved = source.snapshot_json();

        let mut restored = Board::new();
        assert!(restored.restore(&saved));
        let data: Value = serde_json::from_str(&restored.dashboard()).unwrap();
        assert_eq!(data["summary"]["totalTasks"], 3);

        assert!(!restored.restore(r#"{"version": 9}"#));
        assert!(restored.get_last_error().unwrap().contains("version"));
    }

    #[test]
    fn page_size_options() {
        let mut board = board();
        board.open_table();
        assert!(board.set_page_size("all"));
        assert!(!board.set_page_size("7"));
        assert!(!board.go_to_page(2));
        assert_eq!(page(&board)["pages"], serde_json::json!([1]));
    }
}
