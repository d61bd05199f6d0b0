//! Task normalization pipeline
//!
//! Turns the raw grid of an uploaded sheet into the canonical [`Dataset`]:
//!
//! 1. Locate the header row (first row starting with the subject label).
//! 2. Map header labels to task fields; unknown labels become `extra` columns.
//! 3. For every data row with a non-empty first cell: decode dates, resolve
//!    the status, estimate progress and normalize the department.
//!
//! Every view gets its tasks from here, so the rules live in one place.

use std::path::Path;

use tracing::{debug, info};

use crate::date::decode_date;
use crate::entity::{collapse_whitespace, normalize_department};
use crate::progress::{estimate_progress, parse_progress};
use crate::status::resolve_status;
use crate::{
    Cell, Clock, Dataset, EntityNormalizer, Grid, IngestError, PipelineConfig, Task,
};

/// Accepted upload formats
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// `.xlsx` / `.xls`, read into a grid by the host's spreadsheet reader
    Workbook,
    /// `.json`, a serialized row-major grid
    JsonGrid,
}

impl SourceKind {
    /// Classify an upload by extension, rejecting anything else before parsing
    pub fn from_file_name(name: &str) -> Result<Self, IngestError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("xlsx" | "xls") => Ok(SourceKind::Workbook),
            Some("json") => Ok(SourceKind::JsonGrid),
            _ => Err(IngestError::UnsupportedFile(name.to_string())),
        }
    }
}

/// Parse a JSON grid: an array of rows, each an array of null/number/string/bool
pub fn parse_json_grid(text: &str) -> Result<Grid, IngestError> {
    serde_json::from_str(text).map_err(|e| IngestError::Unreadable(e.to_string()))
}

/// Field a source column feeds
#[derive(Clone, Debug, PartialEq, Eq)]
enum Field {
    Subject,
    Department,
    Responsible,
    StartDate,
    ExpectedEndDate,
    ActualEndDate,
    Status,
    Progress,
    TargetPercentage,
    Notes,
    Extra(String),
}

/// Header position of every non-empty column
struct ColumnMap {
    columns: Vec<(usize, Field)>,
}

impl ColumnMap {
    fn from_header(header: &[Cell], config: &PipelineConfig) -> Self {
        let labels = &config.columns;
        let known = [
            (&labels.subject, Field::Subject),
            (&labels.department, Field::Department),
            (&labels.responsible, Field::Responsible),
            (&labels.start_date, Field::StartDate),
            (&labels.expected_end_date, Field::ExpectedEndDate),
            (&labels.actual_end_date, Field::ActualEndDate),
            (&labels.status, Field::Status),
            (&labels.progress, Field::Progress),
            (&labels.target_percentage, Field::TargetPercentage),
            (&labels.notes, Field::Notes),
        ];

        let columns = header
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| {
                let text = cell.as_text();
                let label = collapse_whitespace(&text);
                if label.is_empty() {
                    return None;
                }
                let field = known
                    .iter()
                    .find(|(known_label, _)| collapse_whitespace(known_label) == label)
                    .map_or_else(|| Field::Extra(text.trim().to_string()), |(_, f)| f.clone());
                Some((index, field))
            })
            .collect();
        Self { columns }
    }

    fn extras(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter_map(|(_, field)| match field {
            Field::Extra(label) => Some(label.as_str()),
            _ => None,
        })
    }
}

/// Index of the first row whose first cell is the subject label
pub fn find_header_row(grid: &[Vec<Cell>], subject_label: &str) -> Option<usize> {
    let wanted = collapse_whitespace(subject_label);
    grid.iter().position(|row| {
        row.first()
            .is_some_and(|cell| collapse_whitespace(&cell.as_text()) == wanted)
    })
}

/// Normalization pipeline bound to one configuration and reference clock
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    clock: &'a dyn Clock,
    normalizer: EntityNormalizer,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PipelineConfig, clock: &'a dyn Clock) -> Self {
        Self {
            config,
            clock,
            normalizer: EntityNormalizer::new(config),
        }
    }

    pub fn normalizer(&self) -> &EntityNormalizer {
        &self.normalizer
    }

    /// Validate the upload's file name, then normalize the grid read from it.
    ///
    /// Workbooks are accepted here: the host has already turned the sheet
    /// into `grid_json` with its spreadsheet reader.
    pub fn ingest_grid(&self, file_name: &str, grid_json: &str) -> Result<Dataset, IngestError> {
        let kind = SourceKind::from_file_name(file_name)?;
        debug!(?kind, file_name, "ingesting grid");
        self.run(&parse_json_grid(grid_json)?)
    }

    /// Validate the upload's file name, then parse and normalize a JSON grid file
    pub fn ingest_json(&self, file_name: &str, text: &str) -> Result<Dataset, IngestError> {
        match SourceKind::from_file_name(file_name)? {
            SourceKind::JsonGrid => self.run(&parse_json_grid(text)?),
            SourceKind::Workbook => Err(IngestError::Unreadable(format!(
                "{file_name}: workbooks must be read into a grid before ingestion"
            ))),
        }
    }

    /// Normalize a raw grid into a dataset.
    ///
    /// Fails only when no header row exists; no partial dataset is produced.
    pub fn run(&self, grid: &[Vec<Cell>]) -> Result<Dataset, IngestError> {
        let subject_label = &self.config.columns.subject;
        let header_index = find_header_row(grid, subject_label)
            .ok_or_else(|| IngestError::MissingHeaderRow(subject_label.clone()))?;
        debug!(row = header_index, "header row located");

        let header = &grid[header_index];
        let columns = ColumnMap::from_header(header, self.config);
        let extras: Vec<&str> = columns.extras().collect();
        if !extras.is_empty() {
            debug!(?extras, "columns kept as extra fields");
        }

        let headers: Vec<String> = header
            .iter()
            .map(|cell| cell.as_text().trim().to_string())
            .filter(|label| !label.is_empty())
            .collect();

        let today = self.clock.today();
        let mut skipped = 0usize;
        let mut tasks = Vec::new();
        for row in &grid[header_index + 1..] {
            if row.first().map_or(true, Cell::is_blank) {
                skipped += 1;
                continue;
            }
            tasks.push(self.normalize_row(row, &columns, today));
        }

        info!(tasks = tasks.len(), skipped, %today, "dataset normalized");
        Ok(Dataset::new(headers, tasks))
    }

    fn normalize_row(&self, row: &[Cell], columns: &ColumnMap, today: chrono::NaiveDate) -> Task {
        let markers = &self.config.markers;
        let mut task = Task::new(String::new());
        let mut raw_status = String::new();
        let mut raw_progress = None;

        for (index, field) in &columns.columns {
            let cell = row.get(*index).unwrap_or(&Cell::Empty);
            match field {
                Field::Subject => task.subject = cell.as_text().trim().to_string(),
                Field::Department => task.department = normalize_department(&cell.as_text()),
                Field::Responsible => task.responsible = cell.as_text().trim().to_string(),
                Field::StartDate => task.start_date = decode_date(cell, markers),
                Field::ExpectedEndDate => task.expected_end_date = decode_date(cell, markers),
                Field::ActualEndDate => task.actual_end_date = decode_date(cell, markers),
                Field::Status => raw_status = cell.as_text(),
                Field::Progress => raw_progress = parse_progress(cell),
                Field::TargetPercentage => task.target_percentage = parse_progress(cell),
                Field::Notes => {
                    task.notes = (!cell.is_blank()).then(|| cell.as_text().trim().to_string());
                }
                Field::Extra(label) => {
                    if !cell.is_blank() {
                        task.extra.insert(label.clone(), cell.as_text().trim().to_string());
                    }
                }
            }
        }

        task.status = resolve_status(
            &raw_status,
            &task.expected_end_date,
            &task.actual_end_date,
            today,
            markers,
        );
        task.progress = estimate_progress(raw_progress, &task.status, self.config.delayed_progress);
        task
    }
}
