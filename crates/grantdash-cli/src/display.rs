//! Terminal rendering: vertical record cards, catalog cards, metric blocks
//! and text bar charts.
//!
//! Cards render a single-row RecordBatch grouped by section, so the card and
//! the listing table share one schema.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use grantdash_core::GrantCatalogEntry;
use grantdash_core::record::format_dollars;
use grantdash_store::DashboardMetrics;
use grantdash_store::tracker::{Application, TrackerMetrics};

const BAR_WIDTH: usize = 40;

// ── Card section groupings ──

const OPPORTUNITY: &[&str] = &["opportunity_number", "grant_type", "status", "eligibility"];

const FUNDING: &[&str] = &["funding", "award_floor", "award_ceiling"];

const DEADLINE: &[&str] = &[
    "posted_date",
    "response_date",
    "deadline_status",
    "urgency",
    "progress",
    "opportunity_score",
];

const AGENCY: &[&str] = &["agency", "agency_email", "agency_phone"];

const APPLICANT: &[&str] = &[
    "client", "email", "phone", "business", "industry", "state", "country", "address",
];

// ── Record card ──

/// Print a single scored grant row as a vertical card.
pub fn print_grant_card(batch: &RecordBatch) -> anyhow::Result<()> {
    let number = get_utf8(batch, "opportunity_number").unwrap_or_default();
    let grant_type = get_utf8(batch, "grant_type").unwrap_or_default();

    println!("=== {number} ===");
    if !grant_type.is_empty() {
        println!("{grant_type}");
    }
    println!();

    print_section(batch, "Opportunity", OPPORTUNITY)?;
    print_section(batch, "Funding", FUNDING)?;
    print_section(batch, "Deadline", DEADLINE)?;
    print_section(batch, "Agency", AGENCY)?;
    print_section(batch, "Applicant", APPLICANT)?;
    Ok(())
}

fn print_section(batch: &RecordBatch, header: &str, cols: &[&str]) -> Result<(), ArrowError> {
    let present: Vec<(&str, &ArrayRef)> = cols
        .iter()
        .filter_map(|&name| {
            let idx = batch.schema().index_of(name).ok()?;
            let col = batch.column(idx);
            (!is_blank(col.as_ref())).then_some((name, col))
        })
        .collect();
    if present.is_empty() {
        return Ok(());
    }

    println!("{header}");
    let options = FormatOptions::default();
    for (name, col) in present {
        let value = match col.as_primitive_opt::<Int64Type>() {
            Some(arr) if FUNDING.contains(&name) => format_dollars(arr.value(0)),
            _ if name == "progress" => format!("{:.0}%", float_at(col.as_ref())),
            _ => ArrayFormatter::try_new(col.as_ref(), &options)?
                .value(0)
                .to_string(),
        };
        println!("  {name:<20} {value}");
    }
    println!();
    Ok(())
}

/// Null, or an empty string.
fn is_blank(col: &dyn Array) -> bool {
    if col.is_null(0) {
        return true;
    }
    col.as_string_opt::<i32>()
        .is_some_and(|arr| arr.value(0).is_empty())
}

fn float_at(col: &dyn Array) -> f64 {
    col.as_primitive_opt::<Float64Type>()
        .map_or(0.0, |a| a.value(0))
}

fn get_utf8(batch: &RecordBatch, col_name: &str) -> Option<String> {
    let idx = batch.schema().index_of(col_name).ok()?;
    let col = batch.column(idx);
    if col.is_null(0) {
        return None;
    }
    col.as_string_opt::<i32>().map(|a| a.value(0).to_string())
}

// ── Catalog ──

pub fn print_catalog_card(entry: &GrantCatalogEntry) {
    println!("=== {} ===", entry.name);
    println!("{}", entry.description);
    println!();
    println!("  {:<20} {}", "short_name", entry.short_name);
    println!("  {:<20} {}", "category", entry.category);
    println!("  {:<20} {}", "agency", entry.agency);
    println!("  {:<20} {}", "max_amount", format_dollars(entry.max_amount));
    println!("  {:<20} {}", "avg_amount", format_dollars(entry.avg_amount));
    println!("  {:<20} {:.1}%", "success_rate", entry.success_rate);
    println!("  {:<20} {}", "deadline", entry.deadline);
    println!("  {:<20} {}", "eligibility", entry.eligibility);
    println!("  {:<20} {}", "duration", entry.duration);
    println!();
}

/// Catalog entries as a table for prettyprint.
pub fn catalog_batch(entries: &[&GrantCatalogEntry]) -> Result<RecordBatch, ArrowError> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, false),
        Field::new("category", DataType::Utf8, false),
        Field::new("agency", DataType::Utf8, false),
        Field::new("max_amount", DataType::Int64, false),
        Field::new("avg_amount", DataType::Int64, false),
        Field::new("success_rate", DataType::Float64, false),
        Field::new("deadline", DataType::Utf8, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(entries.iter().map(|e| e.name))),
        Arc::new(StringArray::from_iter_values(
            entries.iter().map(|e| e.category.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(entries.iter().map(|e| e.agency))),
        Arc::new(Int64Array::from_iter_values(entries.iter().map(|e| e.max_amount))),
        Arc::new(Int64Array::from_iter_values(entries.iter().map(|e| e.avg_amount))),
        Arc::new(Float64Array::from_iter_values(
            entries.iter().map(|e| e.success_rate),
        )),
        Arc::new(StringArray::from_iter_values(entries.iter().map(|e| e.deadline))),
    ];
    RecordBatch::try_new(schema, columns)
}

// ── Metrics and charts ──

pub fn print_metrics(m: &DashboardMetrics) {
    println!("Overview");
    println!("  {:<20} {}", "records", m.total_records);
    println!("  {:<20} {}", "grant types", m.grant_types);
    println!("  {:<20} {}", "clients", m.clients);
    println!("  {:<20} {}", "states", m.states);
    println!("  {:<20} {}", "total funding", format_dollars(m.total_funding));
    if let Some(avg) = m.average_funding {
        println!("  {:<20} {}", "average funding", format_dollars(avg.round() as i64));
    }
    println!(
        "  {:<20} {} ({:.1}%)",
        "eligible",
        m.eligible,
        m.eligible_rate * 100.0
    );
    if let Some(score) = m.average_score {
        println!("  {:<20} {score:.1}", "average score");
    }
    if let Some(industry) = &m.top_industry {
        println!("  {:<20} {industry}", "top industry");
    }
    println!();

    let urgency: Vec<(String, usize)> = m
        .by_urgency
        .iter()
        .map(|(u, n)| (u.to_string(), *n))
        .collect();
    print_counts("Deadlines", &urgency);
    print_counts("Status", &m.by_status);
}

// ── Application tracker ──

pub fn print_applications(apps: &[&Application]) {
    if apps.is_empty() {
        println!("No tracked applications.");
        println!();
        return;
    }
    for a in apps {
        println!(
            "  {:<32} {:<14} {:>14}  applied {}  due {}",
            a.name,
            a.status.as_str(),
            format_dollars(a.amount_requested),
            a.application_date,
            a.deadline
        );
        if !a.notes.is_empty() {
            println!("  {:<32} {}", "", a.notes);
        }
    }
    println!();
}

pub fn print_tracker_metrics(m: &TrackerMetrics) {
    println!("Applications");
    println!("  {:<20} {}", "total", m.total);
    println!("  {:<20} {}", "approved", m.approved);
    println!("  {:<20} {}", "total requested", format_dollars(m.total_requested));
    println!("  {:<20} {:.1}%", "success rate", m.success_rate);
    println!();
}

/// Labelled counts as a horizontal bar chart.
pub fn print_counts(title: &str, series: &[(String, usize)]) {
    let values: Vec<(String, i64, String)> = series
        .iter()
        .map(|(label, n)| (label.clone(), *n as i64, n.to_string()))
        .collect();
    print_bars(title, &values);
}

/// Labelled dollar sums as a horizontal bar chart.
pub fn print_amounts(title: &str, series: &[(String, i64)]) {
    let values: Vec<(String, i64, String)> = series
        .iter()
        .map(|(label, v)| (label.clone(), *v, format_dollars(*v)))
        .collect();
    print_bars(title, &values);
}

fn print_bars(title: &str, series: &[(String, i64, String)]) {
    println!("{title}");
    if series.is_empty() {
        println!("  (no data)");
        println!();
        return;
    }
    let max = series.iter().map(|(_, v, _)| *v).max().unwrap_or(0).max(1);
    let width = series
        .iter()
        .map(|(l, _, _)| l.chars().count())
        .max()
        .unwrap_or(0)
        .min(40);
    for (label, value, shown) in series {
        let bar = "#".repeat(bar_len(*value, max));
        println!("  {label:<width$} {bar:<bar_width$} {shown}", bar_width = BAR_WIDTH);
    }
    println!();
}

/// Bar length for `value` against a positive `max`, widened so that sheet
/// amounts near `i64::MAX` cannot overflow.
fn bar_len(value: i64, max: i64) -> usize {
    let scaled = i128::from(value.max(0)) * BAR_WIDTH as i128 / i128::from(max.max(1));
    scaled.min(BAR_WIDTH as i128) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use grantdash_core::catalog;
    use grantdash_core::scoring::ScoredGrantRecord;
    use grantdash_core::{GrantRecord, grants};

    #[test]
    fn blank_detection() {
        let rec = GrantRecord {
            opportunity_number: "GRANT-PEL-2026-001".into(),
            ..Default::default()
        };
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let batch = grants::scored_batch(&[ScoredGrantRecord::new(&rec, today)]).unwrap();
        let col = |name: &str| batch.column(batch.schema().index_of(name).unwrap()).clone();
        assert!(is_blank(col("client").as_ref()));
        assert!(is_blank(col("funding").as_ref()));
        assert!(!is_blank(col("opportunity_number").as_ref()));
        assert_eq!(get_utf8(&batch, "opportunity_number").as_deref(), Some("GRANT-PEL-2026-001"));
    }

    #[test]
    fn bar_lengths_scale_without_overflow() {
        assert_eq!(bar_len(i64::MAX, i64::MAX), BAR_WIDTH);
        assert_eq!(bar_len(i64::MAX / 2, i64::MAX), 19);
        assert_eq!(bar_len(-5, 10), 0);
        assert_eq!(bar_len(0, 0), 0);
        assert_eq!(bar_len(5, 10), BAR_WIDTH / 2);
    }

    #[test]
    fn catalog_table_has_one_row_per_entry() {
        let entries: Vec<_> = catalog::entries().iter().collect();
        let batch = catalog_batch(&entries).unwrap();
        assert_eq!(batch.num_rows(), 25);
        assert_eq!(batch.num_columns(), 7);
    }
}
