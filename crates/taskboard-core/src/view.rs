//! Owned state of the dashboard and table views.
//!
//! Each view is one struct built from the stored snapshot, with explicit
//! mutation methods for every user action. The summary is recomputed on
//! load instead of trusting the stored copy.

use std::ops::{Range, RangeInclusive};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::query::{self, FilterSpec, SortColumn, SortState};
use crate::snapshot::{self, SnapshotStore, StatusHandoff};
use crate::summary::{department_breakdown, percent, DepartmentCount};
use crate::{
    Dataset, EntityNormalizer, PipelineConfig, Report, SnapshotError, StatusLabel, Summary, Task,
};

/// Number of tasks shown in the dashboard preview table
pub const PREVIEW_ROWS: usize = 5;

/// Search input debounce delay
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// A view's content: nothing uploaded yet, or loaded state
#[derive(Clone, Debug, PartialEq)]
pub enum ViewData<T> {
    NoData,
    Ready(T),
}

impl<T> ViewData<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ViewData::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            ViewData::Ready(view) => Some(view),
            ViewData::NoData => None,
        }
    }
}

// ============================================================================
// Dashboard
// ============================================================================

/// One dashboard statistics card; `status: None` is the total card
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCard {
    pub status: Option<StatusLabel>,
    pub count: usize,
    pub percentage: u32,
}

#[derive(Clone, Debug)]
pub struct DashboardView {
    config: PipelineConfig,
    dataset: Dataset,
    summary: Summary,
}

impl DashboardView {
    /// Load from the stored snapshot
    pub fn load(
        store: &dyn SnapshotStore,
        config: PipelineConfig,
    ) -> Result<ViewData<Self>, SnapshotError> {
        Ok(match snapshot::load(store)? {
            Some(snapshot) => ViewData::Ready(Self::from_dataset(snapshot.into_dataset(), config)),
            None => ViewData::NoData,
        })
    }

    pub fn from_dataset(dataset: Dataset, config: PipelineConfig) -> Self {
        let summary = dataset.summary(&EntityNormalizer::new(&config));
        Self {
            config,
            dataset,
            summary,
        }
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// First tasks of the dataset, in source order
    pub fn preview(&self) -> &[Task] {
        let end = self.dataset.tasks.len().min(PREVIEW_ROWS);
        &self.dataset.tasks[..end]
    }

    /// Total card followed by the three status cards
    pub fn status_cards(&self) -> Vec<StatusCard> {
        let total = self.summary.total_tasks;
        let mut cards = vec![StatusCard {
            status: None,
            count: total,
            percentage: percent(total, total),
        }];
        cards.extend(StatusLabel::ALL.into_iter().map(|label| StatusCard {
            status: Some(label),
            count: self.summary.count(label),
            percentage: self.summary.percentage(label),
        }));
        cards
    }

    pub fn department_breakdown(&self) -> Vec<DepartmentCount> {
        department_breakdown(&self.dataset.tasks, &self.config.markers)
    }

    /// Card click: remember the status for the table view
    pub fn select_status(
        store: &mut dyn SnapshotStore,
        status: Option<StatusLabel>,
    ) -> Result<(), SnapshotError> {
        StatusHandoff::set(store, status)
    }

    /// Preview rows, summary and department chart data
    pub fn report(&self) -> Report<'_> {
        Report::new(&self.dataset.headers, self.preview().iter().collect(), &self.summary)
            .with_department_counts(self.department_breakdown())
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Rows per table page
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    Rows(usize),
    All,
}

impl PageSize {
    pub const OPTIONS: [PageSize; 5] = [
        PageSize::Rows(10),
        PageSize::Rows(25),
        PageSize::Rows(50),
        PageSize::Rows(100),
        PageSize::All,
    ];

    /// `"all"` or one of the row counts on offer
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Some(PageSize::All);
        }
        let rows = s.parse::<usize>().ok()?;
        Self::OPTIONS
            .into_iter()
            .find(|size| *size == PageSize::Rows(rows))
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::Rows(25)
    }
}

/// Current page (1-based) and page size
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub size: PageSize,
    page: usize,
}

impl Pagination {
    pub fn new(size: PageSize) -> Self {
        Self { size, page: 1 }
    }

    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    pub fn page_count(&self, total: usize) -> usize {
        match self.size {
            PageSize::All => usize::from(total > 0),
            PageSize::Rows(n) => total.div_ceil(n.max(1)),
        }
    }

    /// Move to `page`; requests outside `1..=page_count` are ignored
    pub fn go_to(&mut self, page: usize, total: usize) -> bool {
        if page == 0 || page > self.page_count(total) {
            return false;
        }
        self.page = page;
        true
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Row range of the current page within `total` rows
    pub fn range(&self, total: usize) -> Range<usize> {
        match self.size {
            PageSize::All => 0..total,
            PageSize::Rows(n) => {
                let start = ((self.page() - 1) * n).min(total);
                start..(start + n).min(total)
            }
        }
    }

    /// Page links around the current page: current ±2, clipped
    pub fn window(&self, total: usize) -> RangeInclusive<usize> {
        let last = self.page_count(total).max(1);
        let page = self.page().min(last);
        page.saturating_sub(2).max(1)..=(page + 2).min(last)
    }
}

// ============================================================================
// Debouncing
// ============================================================================

/// Coalesces rapid updates: only the last value queued within the delay fires.
///
/// Time is supplied by the caller in milliseconds.
#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    delay_ms: u64,
    pending: Option<(T, u64)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    /// Replace any pending value and restart the delay
    pub fn queue(&mut self, value: T, now_ms: u64) {
        self.pending = Some((value, now_ms.saturating_add(self.delay_ms)));
    }

    /// The pending value once its delay has elapsed
    pub fn poll(&mut self, now_ms: u64) -> Option<T> {
        match &self.pending {
            Some((_, due)) if *due <= now_ms => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    /// The pending value, immediately
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

// ============================================================================
// Table
// ============================================================================

/// Filterable, sortable, paginated table over the stored dataset
#[derive(Clone, Debug)]
pub struct TableView {
    config: PipelineConfig,
    normalizer: EntityNormalizer,
    dataset: Dataset,
    summary: Summary,
    filter: FilterSpec,
    sort: SortState,
    pagination: Pagination,
    search: Debouncer<String>,
    /// Filtered then sorted indices into `dataset.tasks`
    visible: Vec<usize>,
}

impl TableView {
    /// Load from the stored snapshot, consuming any status handed over by the dashboard
    pub fn load(
        store: &mut dyn SnapshotStore,
        config: PipelineConfig,
    ) -> Result<ViewData<Self>, SnapshotError> {
        let handoff = StatusHandoff::take(store)?;
        let Some(snapshot) = snapshot::load(store)? else {
            return Ok(ViewData::NoData);
        };
        let mut view = Self::from_dataset(snapshot.into_dataset(), config);
        if let Some(status) = handoff {
            debug!(status = status.key(), "applying status from dashboard");
            view.set_filter(FilterSpec {
                status: Some(status),
                ..FilterSpec::default()
            });
        }
        Ok(ViewData::Ready(view))
    }

    pub fn from_dataset(dataset: Dataset, config: PipelineConfig) -> Self {
        let normalizer = EntityNormalizer::new(&config);
        let summary = dataset.summary(&normalizer);
        let mut view = Self {
            config,
            normalizer,
            dataset,
            summary,
            filter: FilterSpec::default(),
            sort: SortState::default(),
            pagination: Pagination::new(PageSize::default()),
            search: Debouncer::default(),
            visible: Vec::new(),
        };
        view.refresh();
        view
    }

    fn refresh(&mut self) {
        self.visible =
            self.filter
                .filter_indices(&self.dataset.tasks, &self.normalizer, &self.config.markers);
        self.sort.sort_indices(&self.dataset.tasks, &mut self.visible);
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// Replace the filter and go back to the first page
    pub fn set_filter(&mut self, filter: FilterSpec) {
        self.filter = filter;
        self.pagination.reset();
        self.refresh();
    }

    pub fn clear_filters(&mut self) {
        self.search.flush();
        self.set_filter(FilterSpec::default());
    }

    /// Keystroke in the search box; applied by `tick` once input settles
    pub fn queue_search(&mut self, text: impl Into<String>, now_ms: u64) {
        self.search.queue(text.into(), now_ms);
    }

    /// Apply a settled search. Returns true when the visible rows changed.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        match self.search.poll(now_ms) {
            Some(search) => {
                let filter = FilterSpec {
                    search,
                    ..self.filter.clone()
                };
                self.set_filter(filter);
                true
            }
            None => false,
        }
    }

    /// Column header click
    pub fn click_sort(&mut self, column: SortColumn) {
        self.sort.click(column);
        self.refresh();
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
        self.refresh();
    }

    pub fn set_page_size(&mut self, size: PageSize) {
        self.pagination = Pagination::new(size);
    }

    /// Move to `page`; returns false and stays put when it does not exist
    pub fn go_to_page(&mut self, page: usize) -> bool {
        self.pagination.go_to(page, self.visible.len())
    }

    /// Number of rows passing the filter
    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// Every filtered row in display order
    pub fn visible_rows(&self) -> Vec<&Task> {
        self.visible.iter().map(|&i| &self.dataset.tasks[i]).collect()
    }

    /// Rows of the current page
    pub fn page_rows(&self) -> Vec<&Task> {
        self.visible[self.pagination.range(self.visible.len())]
            .iter()
            .map(|&i| &self.dataset.tasks[i])
            .collect()
    }

    /// 1-based first and last row shown, and the filtered total
    pub fn results_info(&self) -> (usize, usize, usize) {
        let total = self.visible.len();
        let range = self.pagination.range(total);
        if range.is_empty() {
            (0, 0, total)
        } else {
            (range.start + 1, range.end, total)
        }
    }

    pub fn department_options(&self) -> Vec<String> {
        query::department_options(&self.dataset.tasks, &self.config)
    }

    pub fn responsible_options(&self) -> Vec<String> {
        query::responsible_options(&self.dataset.tasks, &self.config.markers)
    }

    /// Every filtered row in display order, for export and print
    pub fn report(&self) -> Report<'_> {
        Report::new(&self.dataset.headers, self.visible_rows(), &self.summary)
    }
}
