//! Report generation.
//!
//! A report is either one of the built-in [`QuickReport`]s or a
//! [`ReportTemplate`] saved in the session naming the metrics and charts to
//! include. Both build the same sectioned [`Report`], which can be written as
//! plaintext, JSON or CSV.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::io::Write;

use chrono::NaiveDate;
use grantdash_core::record::format_dollars;
use grantdash_core::{GrantStatus, ScoredGrantRecord};
use serde::Serialize;

use crate::StoreError;
use crate::export::ExportFormat;
use crate::metrics::{self, DashboardMetrics};
use crate::session::{ReportTemplate, Session};

/// Metric names a template may list.
pub const METRICS: &[&str] = &[
    "total_records",
    "grant_types",
    "clients",
    "states",
    "total_funding",
    "average_funding",
    "eligible",
    "average_score",
    "top_industry",
];

/// Chart names a template may list.
pub const CHARTS: &[&str] = &[
    "status_distribution",
    "funding_by_grant_type",
    "funding_histogram",
    "deadlines_by_month",
    "records_by_state",
    "records_by_industry",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickReport {
    ExecutiveSummary,
    ClientAnalysis,
    GrantPerformance,
    FinancialSummary,
    Compliance,
}

impl QuickReport {
    pub const ALL: [QuickReport; 5] = [
        QuickReport::ExecutiveSummary,
        QuickReport::ClientAnalysis,
        QuickReport::GrantPerformance,
        QuickReport::FinancialSummary,
        QuickReport::Compliance,
    ];

    pub fn name(self) -> &'static str {
        match self {
            QuickReport::ExecutiveSummary => "Executive Summary",
            QuickReport::ClientAnalysis => "Client Analysis Report",
            QuickReport::GrantPerformance => "Grant Performance Report",
            QuickReport::FinancialSummary => "Financial Summary",
            QuickReport::Compliance => "Compliance Report",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            QuickReport::ExecutiveSummary => "High-level overview with key metrics",
            QuickReport::ClientAnalysis => "Client demographics by industry and geography",
            QuickReport::GrantPerformance => "Scores, eligibility and funding per grant type",
            QuickReport::FinancialSummary => "Funding totals and their distribution",
            QuickReport::Compliance => "Application status and deadline exposure",
        }
    }

    /// Matches the full name or its first word, ignoring case and punctuation.
    pub fn parse(name: &str) -> Option<Self> {
        let key = fold(name);
        Self::ALL.into_iter().find(|q| {
            let full = fold(q.name());
            let first = q.name().split(' ').next().map(fold).unwrap_or_default();
            key == full || key == first || full.strip_suffix("report") == Some(key.as_str())
        })
    }

    pub fn build(self, rows: &[ScoredGrantRecord<'_>], today: NaiveDate) -> Report {
        let sections = match self {
            QuickReport::ExecutiveSummary => executive_summary(rows, today),
            QuickReport::ClientAnalysis => client_analysis(rows),
            QuickReport::GrantPerformance => grant_performance(rows),
            QuickReport::FinancialSummary => financial_summary(rows),
            QuickReport::Compliance => compliance(rows, today),
        };
        Report::new(self.name(), rows.len(), today, sections)
    }
}

impl fmt::Display for QuickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn fold(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub heading: String,
    pub rows: Vec<(String, String)>,
}

impl Section {
    fn new(heading: &str, rows: Vec<(String, String)>) -> Self {
        Self {
            heading: heading.to_string(),
            rows,
        }
    }

    fn counts(heading: &str, series: Vec<(String, usize)>) -> Self {
        Self::new(
            heading,
            series.into_iter().map(|(k, n)| (k, n.to_string())).collect(),
        )
    }

    fn amounts(heading: &str, series: Vec<(String, i64)>) -> Self {
        Self::new(
            heading,
            series
                .into_iter()
                .map(|(k, v)| (k, format_dollars(v)))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    pub generated: NaiveDate,
    pub record_count: usize,
    pub sections: Vec<Section>,
}

impl Report {
    fn new(title: &str, record_count: usize, generated: NaiveDate, sections: Vec<Section>) -> Self {
        Self {
            title: title.to_string(),
            generated,
            record_count,
            sections,
        }
    }

    pub fn section(&self, heading: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.heading == heading)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title.to_uppercase());
        let _ = writeln!(out, "Generated: {}", self.generated);
        let _ = writeln!(out, "Records:   {}", self.record_count);
        for section in &self.sections {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}:", section.heading);
            if section.rows.is_empty() {
                let _ = writeln!(out, "  (no data)");
            }
            for (label, value) in &section.rows {
                let _ = writeln!(out, "  {label:<32} {value}");
            }
        }
        out
    }

    /// Plaintext, pretty JSON, or CSV with one `section,label,value` line per row.
    pub fn write<W: Write>(&self, format: ExportFormat, mut writer: W) -> Result<(), StoreError> {
        match format {
            ExportFormat::Summary => writer.write_all(self.to_text().as_bytes())?,
            ExportFormat::Json => serde_json::to_writer_pretty(writer, self)?,
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(writer);
                wtr.write_record(["section", "label", "value"])?;
                for section in &self.sections {
                    let heading = section.heading.as_str();
                    for (label, value) in &section.rows {
                        wtr.write_record([heading, label.as_str(), value.as_str()])?;
                    }
                }
                wtr.flush()?;
            }
        }
        Ok(())
    }

    /// `Client_Analysis_Report_YYYYMMDD.<ext>`
    pub fn file_name(&self, format: ExportFormat) -> String {
        format!(
            "{}_{}.{}",
            self.title.split_whitespace().collect::<Vec<_>>().join("_"),
            self.generated.format("%Y%m%d"),
            format.extension()
        )
    }
}

/// What a report name resolves to.
#[derive(Debug, Clone, Copy)]
pub enum ReportSource<'a> {
    Quick(QuickReport),
    Template(&'a ReportTemplate),
}

impl<'a> ReportSource<'a> {
    /// Built-in reports win over session templates of the same name.
    pub fn select(session: &'a Session, name: &str) -> Result<Self, StoreError> {
        match QuickReport::parse(name) {
            Some(quick) => Ok(ReportSource::Quick(quick)),
            None => session.template(name).map(ReportSource::Template),
        }
    }

    pub fn default_format(&self) -> ExportFormat {
        match self {
            ReportSource::Quick(_) => ExportFormat::Summary,
            ReportSource::Template(t) => t.format,
        }
    }

    pub fn build(
        &self,
        rows: &[ScoredGrantRecord<'_>],
        today: NaiveDate,
    ) -> Result<Report, StoreError> {
        match self {
            ReportSource::Quick(quick) => Ok(quick.build(rows, today)),
            ReportSource::Template(template) => from_template(template, rows, today),
        }
    }
}

/// A report with one "Metrics" section for the template's metrics, then one
/// section per chart, in the order the template lists them.
pub fn from_template(
    template: &ReportTemplate,
    rows: &[ScoredGrantRecord<'_>],
    today: NaiveDate,
) -> Result<Report, StoreError> {
    let m = DashboardMetrics::compute(rows);
    let mut sections = Vec::new();
    if !template.metrics.is_empty() {
        let values = template
            .metrics
            .iter()
            .map(|name| metric_value(name, &m).map(|v| (name.clone(), v)))
            .collect::<Result<Vec<_>, _>>()?;
        sections.push(Section::new("Metrics", values));
    }
    for chart in &template.charts {
        sections.push(chart_section(chart, rows)?);
    }
    Ok(Report::new(&template.name, rows.len(), today, sections))
}

/// Reject metric or chart names that no report can render.
pub fn validate_names(metrics: &[String], charts: &[String]) -> Result<(), StoreError> {
    let unknown = metrics
        .iter()
        .find(|m| !METRICS.contains(&m.as_str()))
        .map(|m| format!("unknown metric: {m}"))
        .or_else(|| {
            charts
                .iter()
                .find(|c| !CHARTS.contains(&c.as_str()))
                .map(|c| format!("unknown chart: {c}"))
        });
    match unknown {
        Some(msg) => Err(StoreError::Other(msg)),
        None => Ok(()),
    }
}

fn metric_value(name: &str, m: &DashboardMetrics) -> Result<String, StoreError> {
    let na = || "N/A".to_string();
    Ok(match name {
        "total_records" => m.total_records.to_string(),
        "grant_types" => m.grant_types.to_string(),
        "clients" => m.clients.to_string(),
        "states" => m.states.to_string(),
        "total_funding" => format_dollars(m.total_funding),
        "average_funding" => m
            .average_funding
            .map_or_else(na, |a| format_dollars(a.round() as i64)),
        "eligible" => format!("{} ({:.1}%)", m.eligible, m.eligible_rate * 100.0),
        "average_score" => m.average_score.map_or_else(na, |s| format!("{s:.1}")),
        "top_industry" => m.top_industry.clone().unwrap_or_else(na),
        other => return Err(StoreError::Other(format!("unknown metric: {other}"))),
    })
}

fn chart_section(name: &str, rows: &[ScoredGrantRecord<'_>]) -> Result<Section, StoreError> {
    Ok(match name {
        "status_distribution" => {
            Section::counts("Status distribution", metrics::status_distribution(rows))
        }
        "funding_by_grant_type" => {
            Section::amounts("Funding by grant type", metrics::funding_by_grant_type(rows))
        }
        "funding_histogram" => Section::counts(
            "Funding distribution",
            metrics::funding_histogram(rows)
                .into_iter()
                .map(|(band, n)| (band.to_string(), n))
                .collect(),
        ),
        "deadlines_by_month" => {
            Section::counts("Deadlines by month", metrics::deadlines_by_month(rows))
        }
        "records_by_state" => Section::counts("Records by state", metrics::records_by_state(rows)),
        "records_by_industry" => {
            Section::counts("Records by industry", metrics::records_by_industry(rows))
        }
        other => return Err(StoreError::Other(format!("unknown chart: {other}"))),
    })
}

// ── Quick report bodies ──

fn overview_rows(m: &DashboardMetrics) -> Vec<(String, String)> {
    ["total_records", "grant_types", "clients", "states", "eligible", "average_score"]
        .into_iter()
        .filter_map(|name| metric_value(name, m).ok().map(|v| (name.to_string(), v)))
        .collect()
}

fn executive_summary(rows: &[ScoredGrantRecord<'_>], today: NaiveDate) -> Vec<Section> {
    let m = DashboardMetrics::compute(rows);
    let mut overview = overview_rows(&m);
    overview.push(("total_funding".into(), format_dollars(m.total_funding)));
    overview.push((
        "top_industry".into(),
        m.top_industry.clone().unwrap_or_else(|| "N/A".into()),
    ));
    let deadlines = m
        .by_urgency
        .iter()
        .map(|(u, n)| (u.as_str().to_string(), n.to_string()))
        .chain(std::iter::once((
            "Due within a week".to_string(),
            due_between(rows, today, 0, 7).to_string(),
        )))
        .collect();
    let top = metrics::funding_by_grant_type(rows)
        .into_iter()
        .take(5)
        .collect();
    vec![
        Section::new("Overview", overview),
        Section::new("Deadlines", deadlines),
        Section::amounts("Top grant types by funding", top),
    ]
}

fn client_analysis(rows: &[ScoredGrantRecord<'_>]) -> Vec<Section> {
    let m = DashboardMetrics::compute(rows);
    vec![
        Section::new(
            "Clients",
            vec![
                ("clients".into(), m.clients.to_string()),
                ("records".into(), m.total_records.to_string()),
                ("states".into(), m.states.to_string()),
            ],
        ),
        Section::counts("Industry distribution", metrics::records_by_industry(rows)),
        Section::counts("Geographic distribution", metrics::records_by_state(rows)),
    ]
}

#[derive(Default)]
struct TypeStats {
    records: usize,
    eligible: usize,
    score_sum: u64,
    funding_sum: f64,
    funded: usize,
}

fn grant_performance(rows: &[ScoredGrantRecord<'_>]) -> Vec<Section> {
    let mut by_type: BTreeMap<&str, TypeStats> = BTreeMap::new();
    for s in rows {
        let stats = by_type.entry(s.record.grant_type.as_str()).or_default();
        stats.records += 1;
        stats.eligible += usize::from(s.record.eligibility.is_yes());
        stats.score_sum += u64::from(s.opportunity_score);
        if let Some(f) = s.record.funding {
            stats.funding_sum += f as f64;
            stats.funded += 1;
        }
    }
    let rows = by_type
        .into_iter()
        .filter(|(k, _)| !k.is_empty())
        .map(|(grant_type, st)| {
            let avg_funding = if st.funded == 0 {
                "N/A".to_string()
            } else {
                format_dollars((st.funding_sum / st.funded as f64).round() as i64)
            };
            let value = format!(
                "{} records, avg score {:.1}, {:.0}% eligible, avg funding {avg_funding}",
                st.records,
                st.score_sum as f64 / st.records as f64,
                st.eligible as f64 / st.records as f64 * 100.0,
            );
            (grant_type.to_string(), value)
        })
        .collect();
    vec![Section::new("By grant type", rows)]
}

fn financial_summary(rows: &[ScoredGrantRecord<'_>]) -> Vec<Section> {
    let m = DashboardMetrics::compute(rows);
    let largest = rows.iter().filter_map(|s| s.record.funding).max();
    let totals = vec![
        ("total_funding".into(), format_dollars(m.total_funding)),
        (
            "average_funding".into(),
            m.average_funding
                .map_or_else(|| "N/A".into(), |a| format_dollars(a.round() as i64)),
        ),
        (
            "largest_award".into(),
            largest.map_or_else(|| "N/A".into(), format_dollars),
        ),
    ];
    let histogram = metrics::funding_histogram(rows)
        .into_iter()
        .map(|(band, n)| (band.to_string(), n))
        .collect();
    vec![
        Section::new("Totals", totals),
        Section::amounts("Funding by grant type", metrics::funding_by_grant_type(rows)),
        Section::counts("Funding distribution", histogram),
    ]
}

fn compliance(rows: &[ScoredGrantRecord<'_>], today: NaiveDate) -> Vec<Section> {
    let under_review = rows
        .iter()
        .filter(|s| s.record.status == GrantStatus::UnderReview)
        .count();
    let missing = rows.iter().filter(|s| s.record.response_date.is_none()).count();
    let deadlines = vec![
        ("Past deadline".into(), due_between(rows, today, i64::MIN, -1).to_string()),
        ("Due within a week".into(), due_between(rows, today, 0, 7).to_string()),
        ("Pending review".into(), under_review.to_string()),
        ("No deadline recorded".into(), missing.to_string()),
    ];
    vec![
        Section::counts("Status", metrics::status_distribution(rows)),
        Section::new("Deadlines", deadlines),
    ]
}

fn due_between(rows: &[ScoredGrantRecord<'_>], today: NaiveDate, from: i64, to: i64) -> usize {
    rows.iter()
        .filter(|s| s.days_left(today).is_some_and(|d| (from..=to).contains(&d)))
        .count()
}
