//! Interactive mode. One data source and one session live across commands,
//! so the sheet cache, saved filters, templates, schedules, the report
//! library and tracked applications persist until the shell exits.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use grantdash_core::{DashboardConfig, sample};
use grantdash_store::report::QuickReport;
use grantdash_store::session::Frequency;
use grantdash_store::tracker::{self, TrackerMetrics};
use grantdash_store::{
    Application, ApplicationStatus, DashboardMetrics, ExportFormat, GrantTable, Session, SortKey,
};
use grantdash_sync::{DataSource, SheetFetcher};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::{FilterArgs, display};

#[derive(Parser)]
#[command(no_binary_name = true, name = "grantdash>")]
struct Line {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    /// Headline metrics for the active filter
    Overview,
    /// Page through the active filter's records
    List {
        #[arg(long, default_value = "score")]
        sort: SortKey,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 20)]
        page_size: usize,
    },
    Show {
        opportunity_number: String,
    },
    Charts,
    /// Search the catalog and the records; the query joins the history
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Replace the active filter
    Filter {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Active filter and saved filter sets
    Filters,
    ClearFilters,
    /// Save the active filter under a name
    Save {
        name: String,
    },
    /// Make a saved filter set active
    Load {
        name: String,
    },
    Delete {
        name: String,
    },
    History,
    ClearHistory,
    /// Reload the sheet, served from cache while fresh
    Reload,
    /// Reload the sheet, bypassing the cache
    Refresh,
    ClearCache,
    /// Save a report template
    Template {
        name: String,
        #[arg(long = "metric")]
        metrics: Vec<String>,
        #[arg(long = "chart")]
        charts: Vec<String>,
        #[arg(long, default_value = "summary")]
        format: ExportFormat,
    },
    /// Built-in reports and saved templates
    Templates,
    /// Generate a built-in report or a saved template over the active filter
    Report {
        name: String,
        #[arg(long)]
        format: Option<ExportFormat>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Register a recurring report (nothing is ever sent)
    Schedule {
        name: String,
        #[arg(long)]
        template: String,
        #[arg(long, default_value = "weekly")]
        frequency: Frequency,
        #[arg(long, default_value = "09:00", value_parser = parse_time)]
        time: NaiveTime,
        /// Recipient address (repeatable)
        #[arg(long = "to", required = true)]
        recipients: Vec<String>,
        #[arg(long, default_value = "summary")]
        format: ExportFormat,
    },
    Schedules,
    Unschedule {
        name: String,
    },
    /// Export the active filter
    Export {
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
        #[arg(long, default_value = "score")]
        sort: SortKey,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Generated reports, newest first
    Library {
        query: Option<String>,
    },
    /// Track a grant application
    Apply {
        name: String,
        #[arg(long)]
        grant_type: String,
        #[arg(long)]
        amount: i64,
        /// Application date; today when omitted
        #[arg(long)]
        applied: Option<String>,
        #[arg(long)]
        deadline: String,
        #[arg(long, default_value = "draft")]
        status: ApplicationStatus,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Tracked applications with their metrics
    Applications {
        #[arg(long)]
        status: Vec<ApplicationStatus>,
    },
    /// Change a tracked application's status
    Mark {
        name: String,
        status: ApplicationStatus,
    },
    #[command(alias = "exit")]
    Quit,
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|e| format!("{raw:?}: {e}"))
}

/// Split a command line on whitespace, keeping quoted runs together.
fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    for c in line.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if quote.is_some() {
        return Err("unterminated quote".into());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell<F> {
    source: DataSource<F>,
    url: String,
    sample_only: bool,
    seed: Option<u64>,
    today: NaiveDate,
    session: Session,
    table: GrantTable,
}

impl<F: SheetFetcher> Shell<F> {
    /// Build the shell and perform the first load.
    pub async fn start(
        source: DataSource<F>,
        config: &DashboardConfig,
        sample_only: bool,
        today: NaiveDate,
    ) -> Self {
        let mut shell = Self {
            source,
            url: config.source_url.clone(),
            sample_only,
            seed: config.sample_seed,
            today,
            session: Session::new(),
            table: GrantTable::default(),
        };
        shell.reload(false).await;
        shell
    }

    async fn reload(&mut self, bypass_cache: bool) {
        if self.sample_only {
            eprintln!("Showing sample data.");
            self.table = GrantTable::new(sample::generate(self.seed, self.today));
            return;
        }
        let outcome = if bypass_cache {
            self.source.refresh(&self.url, self.today).await
        } else {
            self.source.load(&self.url, self.today).await
        };
        crate::announce(&outcome);
        self.table = outcome.table;
    }

    /// Read commands until `quit` or end of input. Command errors are printed
    /// and the loop carries on.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> anyhow::Result<()> {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await.context("reading command")? {
            match self.execute(&line).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(err) => eprintln!("error: {err:#}"),
            }
        }
        Ok(())
    }

    pub async fn execute(&mut self, line: &str) -> anyhow::Result<Flow> {
        let words = split_words(line).map_err(anyhow::Error::msg)?;
        if words.is_empty() {
            return Ok(Flow::Continue);
        }
        let command = match Line::try_parse_from(&words) {
            Ok(parsed) => parsed.command,
            Err(err) => {
                // Help and usage errors alike; clap picks the stream.
                let _ = err.print();
                return Ok(Flow::Continue);
            }
        };
        debug!(command = %words[0], "shell command");
        let today = self.today;

        match command {
            ShellCommand::Overview => {
                let rows = self.session.active_filter().apply(self.table.scored(today));
                display::print_metrics(&DashboardMetrics::compute(&rows));
            }
            ShellCommand::List {
                sort,
                page,
                page_size,
            } => crate::cmd_list(&self.table, &self.session, sort, page, page_size, today)?,
            ShellCommand::Show { opportunity_number } => {
                crate::cmd_show(&self.table, &opportunity_number, today)?
            }
            ShellCommand::Charts => {
                let rows = self.session.active_filter().apply(self.table.scored(today));
                crate::cmd_charts(&rows);
            }
            ShellCommand::Search { query } => {
                let query = query.join(" ");
                self.session.record_search(&query);
                crate::cmd_search(&self.table, &query, today)?;
            }
            ShellCommand::Filter { filter } => {
                self.session.set_active_filter(filter.to_filter()?);
                print_chips(&self.session);
            }
            ShellCommand::Filters => {
                print_chips(&self.session);
                for (name, saved) in self.session.saved_filters() {
                    let chips = saved.filter.chips().join(", ");
                    println!("  {name:<20} {chips}");
                }
            }
            ShellCommand::ClearFilters => self.session.clear_filters(),
            ShellCommand::Save { name } => {
                self.session.save_filter(&name)?;
                println!("Saved filter set {name:?}.");
            }
            ShellCommand::Load { name } => {
                self.session.load_filter(&name)?;
                print_chips(&self.session);
            }
            ShellCommand::Delete { name } => {
                if !self.session.delete_filter(&name) {
                    anyhow::bail!("no filter set named {name:?}");
                }
            }
            ShellCommand::History => {
                for (i, query) in self.session.search_history().iter().enumerate() {
                    println!("  {:>2}. {query}", i + 1);
                }
            }
            ShellCommand::ClearHistory => self.session.clear_search_history(),
            ShellCommand::Reload => self.reload(false).await,
            ShellCommand::Refresh => self.reload(true).await,
            ShellCommand::ClearCache => {
                self.source.clear_cache();
                println!("Cache cleared.");
            }
            ShellCommand::Template {
                name,
                metrics,
                charts,
                format,
            } => {
                self.session.save_template(&name, metrics, charts, format)?;
                println!("Saved template {name:?}.");
            }
            ShellCommand::Templates => {
                for quick in QuickReport::ALL {
                    println!("  {:<28} {}", quick.name(), quick.description());
                }
                for t in self.session.templates() {
                    let parts = t.metrics.len() + t.charts.len();
                    println!("  {:<28} custom, {parts} items, {:?}", t.name, t.format);
                }
            }
            ShellCommand::Report {
                name,
                format,
                output,
            } => crate::cmd_report(
                &self.table,
                &mut self.session,
                &name,
                format,
                output.as_ref(),
                today,
            )?,
            ShellCommand::Schedule {
                name,
                template,
                frequency,
                time,
                recipients,
                format,
            } => {
                let recipients: Vec<&str> = recipients.iter().map(String::as_str).collect();
                let r = self.session.schedule_report(
                    &name,
                    &template,
                    frequency,
                    time,
                    &recipients,
                    format,
                )?;
                println!("Scheduled {:?}, next run {}.", r.name, r.next_run);
            }
            ShellCommand::Schedules => {
                for r in self.session.scheduled_reports() {
                    println!(
                        "  {:<20} {:<24} {:<10} {:<28} {}",
                        r.name,
                        r.template,
                        r.frequency.as_str(),
                        r.next_run,
                        r.recipients.join(", ")
                    );
                }
            }
            ShellCommand::Unschedule { name } => {
                if !self.session.unschedule(&name) {
                    anyhow::bail!("no scheduled report named {name:?}");
                }
            }
            ShellCommand::Export {
                format,
                sort,
                output,
            } => crate::cmd_export(
                &self.table,
                &mut self.session,
                format,
                sort,
                output.as_ref(),
                today,
            )?,
            ShellCommand::Library { query } => {
                let entries = self.session.search_library(query.as_deref().unwrap_or(""));
                if entries.is_empty() {
                    println!("Library is empty.");
                }
                for e in entries {
                    println!(
                        "  {:<40} {:<8} {:>6} records  {}",
                        e.name,
                        format!("{:?}", e.format),
                        e.record_count,
                        e.created_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
            ShellCommand::Apply {
                name,
                grant_type,
                amount,
                applied,
                deadline,
                status,
                notes,
            } => {
                let application_date = match applied.as_deref() {
                    Some(raw) => crate::parse_flag_date("--applied", Some(raw))?.unwrap_or(today),
                    None => today,
                };
                let deadline = crate::parse_flag_date("--deadline", Some(deadline.as_str()))?
                    .context("--deadline is required")?;
                let app = Application {
                    name,
                    grant_type,
                    amount_requested: amount,
                    application_date,
                    deadline,
                    status,
                    notes,
                };
                let added = self.session.applications_mut().add(app)?;
                println!("Tracking {:?} ({}).", added.name, added.status);
            }
            ShellCommand::Applications { status } => {
                let apps = self.session.applications().filter(&status);
                display::print_applications(&apps);
                display::print_tracker_metrics(&TrackerMetrics::compute(&apps));
                let by_status: Vec<(String, usize)> = tracker::status_counts(&apps)
                    .into_iter()
                    .map(|(st, n)| (st.to_string(), n))
                    .collect();
                display::print_counts("Applications by status", &by_status);
                display::print_amounts(
                    "Requested by grant type",
                    &tracker::requested_by_type(&apps),
                );
            }
            ShellCommand::Mark { name, status } => {
                self.session.applications_mut().set_status(&name, status)?;
            }
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}

fn print_chips(session: &Session) {
    let chips = session.active_filter().chips();
    if chips.is_empty() {
        println!("No active filters.");
    } else {
        println!("Active: {}", chips.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use grantdash_sync::{IngestionError, parse_csv_body};

    const BODY: &[u8] = b"\
Grant Type,Opportunity Number,Status,Eligibility,Funding,Response Date,Client,State,Industry
Pell Grants,GRANT-PEL-2026-001,Interested,Yes,5000,2026-06-01,Lopez,CA,Education
Pell Grants,GRANT-PEL-2026-002,New,No,7000,2026-09-01,Kim,NY,Education
Rural Development Grants,GRANT-RUR-2026-003,Interested,Yes,250000,2026-05-20,Diaz,TX,Agriculture
";

    struct CountingFetcher {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SheetFetcher for CountingFetcher {
        async fn fetch(&self, _url: &str) -> Result<GrantTable, IngestionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            parse_csv_body(BODY)
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    async fn shell() -> (Shell<CountingFetcher>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = DashboardConfig {
            cache_ttl: Duration::from_secs(300),
            ..Default::default()
        };
        let fetcher = CountingFetcher {
            calls: calls.clone(),
        };
        let source = DataSource::new(fetcher, &config);
        (Shell::start(source, &config, false, today()).await, calls)
    }

    #[test]
    fn words_respect_quotes() {
        assert_eq!(
            split_words(r#"filter --status "Under Review"  --state CA"#).unwrap(),
            vec!["filter", "--status", "Under Review", "--state", "CA"]
        );
        assert_eq!(split_words("save ''").unwrap(), vec!["save", ""]);
        assert!(split_words("search \"open").is_err());
        assert!(split_words("   ").unwrap().is_empty());
    }

    #[tokio::test]
    async fn filters_persist_across_commands() {
        let (mut sh, _) = shell().await;
        assert_eq!(sh.table.len(), 3);

        sh.execute("filter --status Interested --eligible-only").await.unwrap();
        sh.execute("save hot").await.unwrap();
        sh.execute("clear-filters").await.unwrap();
        assert!(sh.session.active_filter().is_empty());

        sh.execute("load hot").await.unwrap();
        let active = sh.session.active_filter();
        assert!(active.eligible_only);
        assert_eq!(active.apply(sh.table.scored(today())).len(), 2);

        sh.execute("delete hot").await.unwrap();
        assert!(sh.execute("load hot").await.is_err());
    }

    #[tokio::test]
    async fn cache_commands_drive_the_source() {
        let (mut sh, calls) = shell().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        sh.execute("reload").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        sh.execute("refresh").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        sh.execute("clear-cache").await.unwrap();
        sh.execute("reload").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sh.table.len(), 3);
    }

    #[tokio::test]
    async fn searches_build_history() {
        let (mut sh, _) = shell().await;
        sh.execute("search pell").await.unwrap();
        sh.execute("search \"Rural Development\"").await.unwrap();
        sh.execute("search pell").await.unwrap();
        assert_eq!(sh.session.search_history(), ["pell", "Rural Development"]);
        sh.execute("clear-history").await.unwrap();
        assert!(sh.session.search_history().is_empty());
    }

    #[tokio::test]
    async fn reports_and_exports_land_in_the_library() {
        let dir = tempfile::tempdir().unwrap();
        let (mut sh, _) = shell().await;

        sh.execute("template Board --metric total_funding --chart records_by_state --format json")
            .await
            .unwrap();
        assert_eq!(sh.session.template("Board").unwrap().format, ExportFormat::Json);

        let client_csv = dir.path().join("clients.csv");
        sh.execute(&format!("report client --format csv --output {}", client_csv.display()))
            .await
            .unwrap();
        let text = std::fs::read_to_string(&client_csv).unwrap();
        assert!(text.contains("Geographic distribution,CA,1"));

        let board = dir.path().join("board.json");
        sh.execute(&format!("report Board --output {}", board.display()))
            .await
            .unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&board).unwrap()).unwrap();
        assert_eq!(value["title"], "Board");

        let export = dir.path().join("grants.json");
        sh.execute(&format!("export --format json --output {}", export.display()))
            .await
            .unwrap();
        assert!(export.exists());

        let names: Vec<&str> = sh.session.library().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["grants.json", "board.json", "clients.csv"]);
        assert_eq!(sh.session.search_library("board").len(), 1);
        assert!(sh.execute("report nonexistent").await.is_err());
    }

    #[tokio::test]
    async fn schedules_are_kept() {
        let (mut sh, _) = shell().await;
        let line = "schedule Digest --template client --frequency monthly --time 08:30 \
                    --to a@example.com";
        sh.execute(line).await.unwrap();
        let r = &sh.session.scheduled_reports()[0];
        assert_eq!(r.frequency, Frequency::Monthly);
        assert_eq!(r.next_run, "1st of next month at 08:30");
        sh.execute("unschedule Digest").await.unwrap();
        assert!(sh.session.scheduled_reports().is_empty());
        assert!(sh.execute("unschedule Digest").await.is_err());
    }

    #[tokio::test]
    async fn application_tracking() {
        let (mut sh, _) = shell().await;
        sh.execute(
            "apply \"STEM Initiative\" --grant-type \"NSF Grant\" --amount 250000 \
             --deadline 2026-06-30 --status submitted",
        )
        .await
        .unwrap();
        sh.execute("apply Lab --grant-type \"NSF Grant\" --amount 50000 --deadline 06/01/2026")
            .await
            .unwrap();
        sh.execute("mark \"STEM Initiative\" approved").await.unwrap();
        sh.execute("applications --status approved").await.unwrap();

        let tracker = sh.session.applications();
        assert_eq!(tracker.applications().len(), 2);
        assert_eq!(tracker.applications()[1].status, ApplicationStatus::Draft);
        assert_eq!(tracker.applications()[1].application_date, today());
        let m = TrackerMetrics::compute(&tracker.filter(&[]));
        assert_eq!(m.approved, 1);
        assert_eq!(m.total_requested, 300_000);
        let duplicate = "apply Lab --grant-type X --amount 1 --deadline 2026-07-01";
        assert!(sh.execute(duplicate).await.is_err());
    }

    #[tokio::test]
    async fn run_stops_at_quit() {
        let (mut sh, _) = shell().await;
        let script: &[u8] = b"search pell\nnot-a-command\nquit\nsearch rural\n";
        sh.run(script).await.unwrap();
        assert_eq!(sh.session.search_history(), ["pell"]);
        assert_eq!(sh.execute("exit").await.unwrap(), Flow::Quit);
    }
}
