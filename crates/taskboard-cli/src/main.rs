//! taskboard CLI - task dashboard over exported spreadsheets
//!
//! Ingests a sheet grid into a stored snapshot, then serves the dashboard,
//! the filterable table and the exports from that snapshot.

mod store;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use taskboard_core::snapshot::{self, Snapshot};
use taskboard_core::{
    Clock, DashboardView, DepartmentCount, FilterSpec, FixedClock, PageSize, Pipeline,
    PipelineConfig, Renderer, Report, SortColumn, SortDirection, SortState, SourceKind,
    StatusCard, StatusLabel, Summary, SystemClock, TableView, ViewData,
};
use taskboard_render::{ExcelExporter, JsonExporter, SvgChartRenderer, TableRenderer, TextRenderer};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::store::DirStore;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(author, version, about = "Task dashboard over exported spreadsheets", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML file overriding column labels, markers and allow-lists
    #[arg(long, value_name = "FILE", global = true, env = "TASKBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the stored snapshot
    #[arg(long, value_name = "DIR", global = true, env = "TASKBOARD_STORE", default_value = ".taskboard")]
    store: PathBuf,

    /// Reference date for overdue checks (YYYY-MM-DD), today when omitted
    #[arg(long, value_name = "DATE", global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a sheet grid and store it as the current dataset
    Ingest {
        /// Input file (.json grid)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show the dashboard of the stored dataset
    Dashboard {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = TextFormat::Text)]
        format: TextFormat,

        /// Remember a status card for the next `table` run (completed, delayed, in-progress or total)
        #[arg(long, value_name = "STATUS")]
        select: Option<String>,
    },

    /// Show the filtered, sorted and paginated task table
    Table {
        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        sort: SortArgs,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Rows per page (10, 25, 50, 100 or all)
        #[arg(long, default_value = "25")]
        page_size: String,

        /// Print the department and responsible filter options
        #[arg(long)]
        options: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = TextFormat::Text)]
        format: TextFormat,
    },

    /// Export every row passing the filters
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        sort: SortArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Xlsx)]
        format: ExportFormat,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render the status and department charts as SVG
    Chart {
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TextFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Xlsx,
    Json,
}

#[derive(Args, Default)]
struct FilterArgs {
    /// Substring of the subject
    #[arg(long)]
    search: Option<String>,

    /// Department
    #[arg(long)]
    department: Option<String>,

    /// Status (completed, delayed or in-progress)
    #[arg(long)]
    status: Option<String>,

    /// Responsible person, matched by substring
    #[arg(long)]
    responsible: Option<String>,

    /// Earliest start date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    from: Option<NaiveDate>,

    /// Latest start date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    to: Option<NaiveDate>,

    /// Minimum progress in percent
    #[arg(long, value_name = "PERCENT")]
    min_progress: Option<f64>,
}

#[derive(Args)]
struct SortArgs {
    /// Sort column (subject, department, responsible, start-date,
    /// expected-end-date, actual-end-date, status, progress)
    #[arg(long, value_name = "COLUMN")]
    sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    desc: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let config = load_config(cli.config.as_deref())?;
    let mut store = DirStore::new(&cli.store);
    debug!(store = %store.dir().display(), "using snapshot store");

    match cli.command {
        Some(Commands::Ingest { file }) => {
            let clock: Box<dyn Clock> = match cli.today {
                Some(date) => Box::new(FixedClock::new(date)),
                None => Box::new(SystemClock),
            };
            cmd_ingest(&file, &config, clock.as_ref(), &mut store)
        }
        Some(Commands::Dashboard { format, select }) => {
            cmd_dashboard(&config, &mut store, format, select.as_deref())
        }
        Some(Commands::Table {
            filter,
            sort,
            page,
            page_size,
            options,
            format,
        }) => {
            let mut table = open_table(&config, &mut store, &filter, &sort)?;
            let size = PageSize::parse(&page_size)
                .with_context(|| format!("Invalid page size '{page_size}' (10, 25, 50, 100 or all)"))?;
            table.set_page_size(size);
            if page != 1 && !table.go_to_page(page) {
                warn!(page, "page out of range, showing page 1");
            }
            cmd_table(&table, format, options)
        }
        Some(Commands::Export {
            filter,
            sort,
            format,
            output,
        }) => {
            let table = open_table(&config, &mut store, &filter, &sort)?;
            cmd_export(&table, &config, cli.today, format, &output)
        }
        Some(Commands::Chart { output }) => cmd_chart(&config, &store, output.as_deref()),
        None => {
            println!("taskboard - task dashboard over exported spreadsheets");
            println!("Run with --help for usage information");
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = toml::from_str(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    info!(path = %path.display(), "loaded config");
    Ok(config)
}

const NO_DATA: &str = "No data loaded. Run `taskboard ingest FILE` first.";

// ============================================================================
// Commands
// ============================================================================

fn cmd_ingest(
    file: &Path,
    config: &PipelineConfig,
    clock: &dyn Clock,
    store: &mut DirStore,
) -> Result<()> {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if SourceKind::from_file_name(&name)? == SourceKind::Workbook {
        bail!("{name}: workbooks are not read directly; export the sheet as a JSON grid");
    }
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let pipeline = Pipeline::new(config, clock);
    let dataset = pipeline.ingest_json(&name, &text)?;
    let snapshot = Snapshot::from_dataset(dataset, pipeline.normalizer());
    snapshot::save(store, &snapshot)?;
    info!(tasks = snapshot.tasks.len(), "dataset stored");

    let summary = &snapshot.summary;
    println!(
        "Loaded {} tasks from {} ({} {}, {} {}, {} {})",
        summary.total_tasks,
        name,
        summary.completed_tasks,
        StatusLabel::Completed,
        summary.delayed_tasks,
        StatusLabel::Delayed,
        summary.in_progress_tasks,
        StatusLabel::InProgress,
    );
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardJson<'a> {
    summary: &'a Summary,
    cards: Vec<StatusCard>,
    departments: Vec<DepartmentCount>,
    preview: &'a [taskboard_core::Task],
}

fn cmd_dashboard(
    config: &PipelineConfig,
    store: &mut DirStore,
    format: TextFormat,
    select: Option<&str>,
) -> Result<()> {
    let ViewData::Ready(dashboard) = DashboardView::load(&*store, config.clone())? else {
        bail!(NO_DATA);
    };

    if let Some(key) = select {
        let status = if key.eq_ignore_ascii_case("total") {
            None
        } else {
            Some(parse_status(key)?)
        };
        DashboardView::select_status(store, status)?;
        info!(status = key, "status selected for the table");
    }

    match format {
        TextFormat::Text => {
            let text = TextRenderer::new()
                .columns(config.columns.clone())
                .render(&dashboard.report())?;
            print!("{text}");
        }
        TextFormat::Json => {
            let json = DashboardJson {
                summary: dashboard.summary(),
                cards: dashboard.status_cards(),
                departments: dashboard.department_breakdown(),
                preview: dashboard.preview(),
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}

/// Load the table view and apply command-line filters over any dashboard selection
fn open_table(
    config: &PipelineConfig,
    store: &mut DirStore,
    args: &FilterArgs,
    sort: &SortArgs,
) -> Result<TableView> {
    let ViewData::Ready(mut table) = TableView::load(store, config.clone())? else {
        bail!(NO_DATA);
    };

    let filter = merge_filter(table.filter().clone(), args)?;
    if !filter.is_empty() {
        debug!(?filter, "applying filter");
    }
    table.set_filter(filter);

    if let Some(key) = sort.sort.as_deref() {
        let column = SortColumn::from_key(key).with_context(|| {
            let keys: Vec<&str> = SortColumn::ALL.iter().map(|c| c.key()).collect();
            format!("Unknown sort column '{key}' (expected one of: {})", keys.join(", "))
        })?;
        let direction = if sort.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        table.set_sort(SortState::new(column, direction));
    }
    Ok(table)
}

fn merge_filter(mut filter: FilterSpec, args: &FilterArgs) -> Result<FilterSpec> {
    if let Some(search) = &args.search {
        filter.search = search.clone();
    }
    if let Some(department) = &args.department {
        filter.department = Some(department.clone());
    }
    if let Some(status) = &args.status {
        filter.status = Some(parse_status(status)?);
    }
    if let Some(responsible) = &args.responsible {
        filter.responsible = Some(responsible.clone());
    }
    if args.from.is_some() {
        filter.start_from = args.from;
    }
    if args.to.is_some() {
        filter.start_to = args.to;
    }
    if let Some(percent) = args.min_progress {
        if !(0.0..=100.0).contains(&percent) {
            bail!("--min-progress must be between 0 and 100, got {percent}");
        }
        filter.min_progress = percent / 100.0;
    }
    Ok(filter)
}

fn parse_status(key: &str) -> Result<StatusLabel> {
    StatusLabel::from_key(key)
        .with_context(|| format!("Unknown status '{key}' (expected completed, delayed or in-progress)"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TablePage<'a> {
    page: usize,
    page_count: usize,
    first: usize,
    last: usize,
    total: usize,
    headers: &'a [String],
    tasks: Vec<&'a taskboard_core::Task>,
}

fn cmd_table(table: &TableView, format: TextFormat, options: bool) -> Result<()> {
    let pagination = table.pagination();
    let total = table.visible_count();
    let (first, last, _) = table.results_info();

    match format {
        TextFormat::Json => {
            let page = TablePage {
                page: pagination.page(),
                page_count: pagination.page_count(total),
                first,
                last,
                total,
                headers: &table.dataset().headers,
                tasks: table.page_rows(),
            };
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        TextFormat::Text => {
            if options {
                println!("Departments: {}", table.department_options().join(", "));
                println!("Responsible: {}", table.responsible_options().join(", "));
                println!();
            }
            if total == 0 {
                println!("No tasks match the current filters.");
                return Ok(());
            }
            let report = Report::new(&table.dataset().headers, table.page_rows(), table.summary());
            print!("{}", TableRenderer::new().render(&report)?);
            println!();
            println!("Showing {first}-{last} of {total}");
            let pages: Vec<String> = pagination
                .window(total)
                .map(|p| {
                    if p == pagination.page() {
                        format!("[{p}]")
                    } else {
                        p.to_string()
                    }
                })
                .collect();
            println!(
                "Page {} of {}: {}",
                pagination.page(),
                pagination.page_count(total),
                pages.join(" ")
            );
        }
    }
    Ok(())
}

fn cmd_export(
    table: &TableView,
    config: &PipelineConfig,
    today: Option<NaiveDate>,
    format: ExportFormat,
    output: &Path,
) -> Result<()> {
    let report = table.report();
    match format {
        ExportFormat::Xlsx => {
            let mut exporter = ExcelExporter::new()
                .columns(config.columns.clone())
                .markers(config.markers.clone());
            if let Some(date) = today {
                exporter = exporter.as_of(date);
            }
            let bytes = exporter.render(&report)?;
            fs::write(output, bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
        }
        ExportFormat::Json => {
            let json = JsonExporter::new().pretty().render(&report)?;
            fs::write(output, json)
                .with_context(|| format!("Failed to write {}", output.display()))?;
        }
    }
    println!("Exported {} tasks to {}", report.rows.len(), output.display());
    Ok(())
}

fn cmd_chart(config: &PipelineConfig, store: &DirStore, output: Option<&Path>) -> Result<()> {
    let ViewData::Ready(dashboard) = DashboardView::load(store, config.clone())? else {
        bail!(NO_DATA);
    };
    let svg = SvgChartRenderer::new().render(&dashboard.report())?;
    match output {
        Some(path) => {
            fs::write(path, svg).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Chart written to {}", path.display());
        }
        None => print!("{svg}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn command_line_filters_override_selection() {
        let selected = FilterSpec {
            status: Some(StatusLabel::Delayed),
            ..FilterSpec::default()
        };
        let args = FilterArgs {
            responsible: Some("البدر".into()),
            min_progress: Some(50.0),
            ..FilterArgs::default()
        };
        let filter = merge_filter(selected, &args).unwrap();
        assert_eq!(filter.status, Some(StatusLabel::Delayed));
        assert_eq!(filter.responsible.as_deref(), Some("البدر"));
        assert_eq!(filter.min_progress, 0.5);

        let args = FilterArgs {
            status: Some("completed".into()),
            ..FilterArgs::default()
        };
        let filter = merge_filter(filter, &args).unwrap();
        assert_eq!(filter.status, Some(StatusLabel::Completed));
    }

    #[test]
    fn invalid_filter_values_are_rejected() {
        let args = FilterArgs {
            status: Some("done".into()),
            ..FilterArgs::default()
        };
        assert!(merge_filter(FilterSpec::default(), &args).is_err());

        let args = FilterArgs {
            min_progress: Some(150.0),
            ..FilterArgs::default()
        };
        assert!(merge_filter(FilterSpec::default(), &args).is_err());
    }
}
