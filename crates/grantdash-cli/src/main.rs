mod display;
mod shell;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use arrow::util::pretty::pretty_format_batches;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use grantdash_core::config::{DEFAULT_SHEET_NAME, DEFAULT_SOURCE_URL};
use grantdash_core::scoring::ScoredGrantRecord;
use grantdash_core::{
    DashboardConfig, GrantCategory, GrantStatus, catalog, dates, grants, parse_date, sample,
};
use grantdash_store::export::{self, ExportFormat};
use grantdash_store::metrics::{self, DashboardMetrics};
use grantdash_store::view::{self, DateRange, FundingBand, SortKey, ViewFilter};
use grantdash_store::{GrantTable, ReportSource, Session};
use grantdash_sync::{DataSource, LoadOutcome, Origin, SheetClient};
use tracing::{Level, info};

#[derive(Parser)]
#[command(name = "grantdash", version, about = "Grant opportunity dashboard")]
struct Cli {
    /// Google Sheets share URL to load grant records from
    #[arg(long, env = "GRANTDASH_SOURCE_URL", default_value = DEFAULT_SOURCE_URL, global = true)]
    source_url: String,

    /// Worksheet name within the spreadsheet
    #[arg(long, default_value = DEFAULT_SHEET_NAME, global = true)]
    sheet: String,

    /// Skip the network and use generated sample data
    #[arg(long, global = true)]
    sample: bool,

    /// Seed for sample data
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// HTTP timeout for the sheet download
    #[arg(long, default_value_t = 10, global = true)]
    timeout_secs: u64,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Headline metrics plus deadline and status breakdowns
    Overview {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Filtered, sorted, paginated table of scored records
    List {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "score")]
        sort: SortKey,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 20)]
        page_size: usize,
    },
    /// One scored record as a card
    Show {
        /// Opportunity number, e.g. GRANT-PEL-2026-016
        opportunity_number: String,
    },
    /// Browse the grant type catalog
    Catalog {
        /// Show the full entry for one grant type
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        query: Option<String>,
    },
    /// Search the catalog and the loaded records
    Search { query: String },
    /// Chart series as text
    Charts {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Export the filtered view
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
        #[arg(long, default_value = "score")]
        sort: SortKey,
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Generate a built-in report (executive, client, grant, financial, compliance)
    Report {
        name: String,
        #[command(flatten)]
        filter: FilterArgs,
        /// csv, json or summary; summary when omitted
        #[arg(long)]
        format: Option<ExportFormat>,
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Interactive session keeping filters, templates and the cache between commands
    Shell,
}

#[derive(Args, Clone, Default)]
struct FilterArgs {
    /// Status (repeatable): New, "Under Review", Interested, "Not Interested"
    #[arg(long)]
    status: Vec<String>,
    #[arg(long)]
    grant_type: Vec<String>,
    /// Catalog category (repeatable)
    #[arg(long)]
    category: Vec<String>,
    #[arg(long)]
    industry: Vec<String>,
    #[arg(long)]
    state: Vec<String>,
    /// Lowest funding band, e.g. 50k or "$25K-50K"
    #[arg(long)]
    min_band: Option<FundingBand>,
    /// Highest funding band, e.g. 500k+
    #[arg(long)]
    max_band: Option<FundingBand>,
    /// Earliest response deadline
    #[arg(long)]
    due_from: Option<String>,
    /// Latest response deadline
    #[arg(long)]
    due_to: Option<String>,
    #[arg(long)]
    eligible_only: bool,
    /// Free-text match on type, number, client, business, industry, agency, state
    #[arg(long)]
    query: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> anyhow::Result<ViewFilter> {
        let categories = self
            .category
            .iter()
            .map(|c| GrantCategory::parse(c).with_context(|| format!("unknown category: {c}")))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let lo = self.min_band.unwrap_or(FundingBand::UpTo25K);
        let hi = self.max_band.unwrap_or(FundingBand::Over500K);
        if lo > hi {
            bail!("--min-band {lo} is above --max-band {hi}");
        }
        Ok(ViewFilter {
            statuses: self.status.iter().map(|s| GrantStatus::parse(s)).collect(),
            grant_types: self.grant_type.clone(),
            categories,
            industries: self.industry.clone(),
            states: self.state.clone(),
            funding_bands: (lo, hi),
            posted: DateRange::default(),
            response: DateRange {
                from: parse_flag_date("--due-from", self.due_from.as_deref())?,
                to: parse_flag_date("--due-to", self.due_to.as_deref())?,
            },
            eligible_only: self.eligible_only,
            query: self.query.clone(),
        })
    }
}

fn parse_flag_date(flag: &str, raw: Option<&str>) -> anyhow::Result<Option<NaiveDate>> {
    match raw {
        None => Ok(None),
        Some(raw) => parse_date(raw)
            .map(Some)
            .with_context(|| format!("{flag}: unrecognised date {raw:?}")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(io::stderr)
        .init();

    let config = DashboardConfig {
        source_url: cli.source_url.clone(),
        sheet_name: cli.sheet.clone(),
        fetch_timeout: Duration::from_secs(cli.timeout_secs),
        sample_seed: cli.seed,
        ..Default::default()
    };
    let today = dates::today();
    let mut session = Session::new();

    match &cli.command {
        Command::Catalog {
            name,
            category,
            query,
        } => cmd_catalog(name.as_deref(), category.as_deref(), query.as_deref()),
        Command::Overview { filter } => {
            let table = load_table(&cli, &config, today).await?;
            let rows = filter.to_filter()?.apply(table.scored(today));
            display::print_metrics(&DashboardMetrics::compute(&rows));
            Ok(())
        }
        Command::List {
            filter,
            sort,
            page,
            page_size,
        } => {
            let table = load_table(&cli, &config, today).await?;
            session.set_active_filter(filter.to_filter()?);
            cmd_list(&table, &session, *sort, *page, *page_size, today)
        }
        Command::Show { opportunity_number } => {
            let table = load_table(&cli, &config, today).await?;
            cmd_show(&table, opportunity_number, today)
        }
        Command::Search { query } => {
            let table = load_table(&cli, &config, today).await?;
            session.record_search(query);
            cmd_search(&table, query, today)
        }
        Command::Charts { filter } => {
            let table = load_table(&cli, &config, today).await?;
            let rows = filter.to_filter()?.apply(table.scored(today));
            cmd_charts(&rows);
            Ok(())
        }
        Command::Export {
            filter,
            format,
            sort,
            output,
        } => {
            let table = load_table(&cli, &config, today).await?;
            session.set_active_filter(filter.to_filter()?);
            cmd_export(&table, &mut session, *format, *sort, output.as_ref(), today)
        }
        Command::Report {
            name,
            filter,
            format,
            output,
        } => {
            let table = load_table(&cli, &config, today).await?;
            session.set_active_filter(filter.to_filter()?);
            cmd_report(&table, &mut session, name, *format, output.as_ref(), today)
        }
        Command::Shell => {
            let client = SheetClient::new(config.fetch_timeout).context("building HTTP client")?;
            let source = DataSource::new(client, &config);
            let mut shell = shell::Shell::start(source, &config, cli.sample, today).await;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            shell.run(stdin).await
        }
    }
}

/// Fetch the sheet, or generate sample data when asked to or when the
/// fetch fails. Sample data is always announced on stderr.
async fn load_table(
    cli: &Cli,
    config: &DashboardConfig,
    today: NaiveDate,
) -> anyhow::Result<GrantTable> {
    if cli.sample {
        eprintln!("Showing sample data.");
        return Ok(GrantTable::new(sample::generate(config.sample_seed, today)));
    }

    let client = SheetClient::new(config.fetch_timeout).context("building HTTP client")?;
    let mut source = DataSource::new(client, config);
    let outcome = source.load(&config.source_url, today).await;
    announce(&outcome);
    Ok(outcome.table)
}

/// Print the fallback warning and sample-data banner on stderr.
fn announce(outcome: &LoadOutcome) {
    if let Some(warning) = &outcome.warning {
        eprintln!("Warning: {warning}");
    }
    if outcome.origin == Origin::Sample {
        eprintln!("Showing sample data.");
    }
    info!(rows = outcome.table.len(), origin = ?outcome.origin, "table ready");
}

fn cmd_show(table: &GrantTable, opportunity_number: &str, today: NaiveDate) -> anyhow::Result<()> {
    let record = table.get(opportunity_number)?;
    let batch = grants::scored_batch(&[ScoredGrantRecord::new(record, today)])?;
    display::print_grant_card(&batch)?;
    if let Some(entry) = catalog::lookup(&record.grant_type) {
        display::print_catalog_card(entry);
    }
    Ok(())
}

fn cmd_list(
    table: &GrantTable,
    session: &Session,
    sort: SortKey,
    page: usize,
    page_size: usize,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let filter = session.active_filter();
    let mut rows = filter.apply(table.scored(today));
    view::sort_scored(&mut rows, sort);
    let page = view::paginate(rows, page, page_size);

    for chip in filter.chips() {
        eprintln!("  [{chip}]");
    }
    if page.items.is_empty() {
        println!("No matching records.");
    } else {
        let batch = grants::scored_batch(&page.items)?;
        let batch = grants::project(&batch, grants::LIST_COLUMNS)?;
        println!("{}", pretty_format_batches(&[batch])?);
    }
    println!(
        "Page {} of {} ({} records)",
        page.page,
        page.total_pages.max(1),
        page.total_items
    );
    Ok(())
}

fn cmd_catalog(
    name: Option<&str>,
    category: Option<&str>,
    query: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(name) = name {
        let entry =
            catalog::lookup(name).with_context(|| format!("no catalog entry named {name:?}"))?;
        display::print_catalog_card(entry);
        return Ok(());
    }

    let mut entries: Vec<_> = match query {
        Some(q) => catalog::search(q),
        None => catalog::entries().iter().collect(),
    };
    if let Some(c) = category {
        let category = GrantCategory::parse(c).with_context(|| format!("unknown category: {c}"))?;
        entries.retain(|e| e.category == category);
    }
    if entries.is_empty() {
        println!("No matching grant types.");
        return Ok(());
    }
    let batch = display::catalog_batch(&entries)?;
    println!("{}", pretty_format_batches(&[batch])?);
    Ok(())
}

fn cmd_search(table: &GrantTable, query: &str, today: NaiveDate) -> anyhow::Result<()> {
    let entries = catalog::search(query);
    println!("Grant types ({})", entries.len());
    if !entries.is_empty() {
        println!("{}", pretty_format_batches(&[display::catalog_batch(&entries)?])?);
    }

    let filter = ViewFilter {
        query: Some(query.to_string()),
        ..Default::default()
    };
    let mut rows = filter.apply(table.scored(today));
    view::sort_scored(&mut rows, SortKey::Score);
    println!("Records ({})", rows.len());
    if !rows.is_empty() {
        let batch = grants::project(&grants::scored_batch(&rows)?, grants::LIST_COLUMNS)?;
        println!("{}", pretty_format_batches(&[batch])?);
    }

    let hints = view::suggestions(query);
    if !hints.is_empty() {
        println!("Suggestions:");
        for hint in hints {
            println!("  {hint}");
        }
    }
    Ok(())
}

fn cmd_charts(rows: &[ScoredGrantRecord<'_>]) {
    display::print_counts("Status distribution", &metrics::status_distribution(rows));
    display::print_amounts("Funding by grant type", &metrics::funding_by_grant_type(rows));
    let histogram: Vec<(String, usize)> = metrics::funding_histogram(rows)
        .into_iter()
        .map(|(band, n)| (band.to_string(), n))
        .collect();
    display::print_counts("Funding distribution", &histogram);
    display::print_counts("Deadlines by month", &metrics::deadlines_by_month(rows));
    display::print_counts("Records by state", &metrics::records_by_state(rows));
    display::print_counts("Records by industry", &metrics::records_by_industry(rows));
}

fn cmd_export(
    table: &GrantTable,
    session: &mut Session,
    format: ExportFormat,
    sort: SortKey,
    output: Option<&PathBuf>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let mut rows = session.active_filter().apply(table.scored(today));
    view::sort_scored(&mut rows, sort);

    match output {
        Some(path) => {
            export::export_to_path(format, &rows, today, path)
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!("Wrote {} records to {}", rows.len(), path.display());
        }
        None => export::write_export(format, &rows, today, io::stdout().lock())?,
    }

    let name = output
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| export::default_file_name(format, today));
    session.add_to_library(&name, format, rows.len(), Vec::new());
    Ok(())
}

/// Build a built-in report or a session template over the active filter and
/// log it in the session's library.
fn cmd_report(
    table: &GrantTable,
    session: &mut Session,
    name: &str,
    format: Option<ExportFormat>,
    output: Option<&PathBuf>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let rows = session.active_filter().apply(table.scored(today));
    let source = ReportSource::select(session, name)?;
    let format = format.unwrap_or(source.default_format());
    let report = source.build(&rows, today)?;

    let file_name = match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            report.write(format, &mut writer)?;
            writer
                .flush()
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!("Wrote {} to {}", report.title, path.display());
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| report.file_name(format))
        }
        None => {
            report.write(format, io::stdout().lock())?;
            report.file_name(format)
        }
    };
    session.add_to_library(&file_name, format, report.record_count, vec![report.title]);
    Ok(())
}
