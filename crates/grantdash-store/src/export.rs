//! CSV, JSON and plaintext exports of a scored view.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use grantdash_core::record::format_dollars;
use grantdash_core::ScoredGrantRecord;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::StoreError;
use crate::metrics::{DashboardMetrics, funding_by_grant_type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Json,
    Summary,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Summary => "txt",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "summary" | "txt" | "text" => Ok(ExportFormat::Summary),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// One flat output row. Column order here is the CSV header order.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    grant_type: &'a str,
    opportunity_number: &'a str,
    status: &'a str,
    eligibility: &'a str,
    funding: Option<i64>,
    award_ceiling: Option<i64>,
    award_floor: Option<i64>,
    posted_date: Option<NaiveDate>,
    response_date: Option<NaiveDate>,
    agency: &'a str,
    agency_email: &'a str,
    agency_phone: &'a str,
    client: &'a str,
    email: &'a str,
    phone: &'a str,
    business: &'a str,
    industry: &'a str,
    state: &'a str,
    country: &'a str,
    address: &'a str,
    opportunity_score: u8,
    deadline_status: &'a str,
    urgency: &'a str,
    progress: f64,
}

impl<'a> From<&'a ScoredGrantRecord<'a>> for ExportRow<'a> {
    fn from(s: &'a ScoredGrantRecord<'a>) -> Self {
        let r = s.record;
        Self {
            grant_type: &r.grant_type,
            opportunity_number: &r.opportunity_number,
            status: r.status.as_str(),
            eligibility: r.eligibility.as_str(),
            funding: r.funding,
            award_ceiling: r.award_ceiling,
            award_floor: r.award_floor,
            posted_date: r.posted_date,
            response_date: r.response_date,
            agency: &r.agency,
            agency_email: &r.agency_email,
            agency_phone: &r.agency_phone,
            client: &r.client,
            email: &r.email,
            phone: &r.phone,
            business: &r.business,
            industry: &r.industry,
            state: &r.state,
            country: &r.country,
            address: &r.address,
            opportunity_score: s.opportunity_score,
            deadline_status: &s.deadline.label,
            urgency: s.deadline.urgency.as_str(),
            progress: s.progress,
        }
    }
}

/// Header row plus one line per record. Missing values are empty fields.
pub fn write_csv<W: Write>(rows: &[ScoredGrantRecord<'_>], writer: W) -> Result<(), StoreError> {
    let mut wtr = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        // serde only emits headers alongside the first record.
        wtr.write_record(CSV_HEADERS)?;
    }
    for s in rows {
        wtr.serialize(ExportRow::from(s))?;
    }
    wtr.flush()?;
    Ok(())
}

const CSV_HEADERS: [&str; 24] = [
    "grant_type",
    "opportunity_number",
    "status",
    "eligibility",
    "funding",
    "award_ceiling",
    "award_floor",
    "posted_date",
    "response_date",
    "agency",
    "agency_email",
    "agency_phone",
    "client",
    "email",
    "phone",
    "business",
    "industry",
    "state",
    "country",
    "address",
    "opportunity_score",
    "deadline_status",
    "urgency",
    "progress",
];

/// A JSON array of objects; dates are `YYYY-MM-DD` or `null`.
pub fn write_json<W: Write>(rows: &[ScoredGrantRecord<'_>], writer: W) -> Result<(), StoreError> {
    let out: Vec<ExportRow<'_>> = rows.iter().map(ExportRow::from).collect();
    serde_json::to_writer_pretty(writer, &out)?;
    Ok(())
}

/// Plaintext executive summary of a view.
pub fn summary_report(rows: &[ScoredGrantRecord<'_>], today: NaiveDate) -> String {
    let m = DashboardMetrics::compute(rows);
    let mut out = String::new();
    let _ = writeln!(out, "GRANT PORTFOLIO SUMMARY");
    let _ = writeln!(out, "Generated: {today}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Total records:      {}", m.total_records);
    let _ = writeln!(out, "Grant types:        {}", m.grant_types);
    let _ = writeln!(out, "Clients:            {}", m.clients);
    let _ = writeln!(out, "States:             {}", m.states);
    let _ = writeln!(out, "Total funding:      {}", format_dollars(m.total_funding));
    let _ = writeln!(
        out,
        "Average funding:    {}",
        m.average_funding
            .map(|a| format_dollars(a.round() as i64))
            .unwrap_or_else(|| "N/A".into())
    );
    let _ = writeln!(
        out,
        "Eligible:           {} ({:.1}%)",
        m.eligible,
        m.eligible_rate * 100.0
    );
    let _ = writeln!(
        out,
        "Average score:      {}",
        m.average_score
            .map(|a| format!("{a:.1}"))
            .unwrap_or_else(|| "N/A".into())
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "By status:");
    for (label, n) in &m.by_status {
        let _ = writeln!(out, "  {label:<16} {n}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "By deadline:");
    for (u, n) in &m.by_urgency {
        let _ = writeln!(out, "  {:<16} {n}", u.as_str());
    }
    let due_in = |range: std::ops::RangeInclusive<i64>| {
        rows.iter()
            .filter(|s| s.days_left(today).is_some_and(|d| range.contains(&d)))
            .count()
    };
    let due_soon = due_in(0..=7);
    if due_soon > 0 {
        let _ = writeln!(out, "  {} due within a week", opportunities(due_soon));
    }
    let overdue = due_in(i64::MIN..=-1);
    if overdue > 0 {
        let _ = writeln!(out, "  {} past their deadline", opportunities(overdue));
    }

    let top: Vec<_> = funding_by_grant_type(rows).into_iter().take(5).collect();
    if !top.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Top grant types by funding:");
        for (grant_type, sum) in top {
            let _ = writeln!(out, "  {grant_type:<40} {}", format_dollars(sum));
        }
    }
    out
}

fn opportunities(n: usize) -> String {
    if n == 1 {
        "1 opportunity".to_string()
    } else {
        format!("{n} opportunities")
    }
}

/// Write `rows` in `format` to `writer`.
pub fn write_export<W: Write>(
    format: ExportFormat,
    rows: &[ScoredGrantRecord<'_>],
    today: NaiveDate,
    mut writer: W,
) -> Result<(), StoreError> {
    match format {
        ExportFormat::Csv => write_csv(rows, writer),
        ExportFormat::Json => write_json(rows, writer),
        ExportFormat::Summary => {
            writer.write_all(summary_report(rows, today).as_bytes())?;
            Ok(())
        }
    }
}

/// Write an export to a file, replacing any existing one.
pub fn export_to_path(
    format: ExportFormat,
    rows: &[ScoredGrantRecord<'_>],
    today: NaiveDate,
    path: &Path,
) -> Result<(), StoreError> {
    let mut file = BufWriter::new(File::create(path)?);
    write_export(format, rows, today, &mut file)?;
    file.flush()?;
    info!(path = %path.display(), rows = rows.len(), format = ?format, "wrote export");
    Ok(())
}

/// `grants_YYYYMMDD.<ext>`
pub fn default_file_name(format: ExportFormat, today: NaiveDate) -> String {
    format!("grants_{}.{}", today.format("%Y%m%d"), format.extension())
}
