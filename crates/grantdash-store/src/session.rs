//! Per-user session state: search history, saved filters, report templates,
//! scheduled reports, the report library and tracked applications.
//!
//! Lives only as long as the process. Scheduled reports are bookkeeping only;
//! nothing is ever run or delivered.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::StoreError;
use crate::export::ExportFormat;
use crate::report;
use crate::tracker::ApplicationTracker;
use crate::view::ViewFilter;

pub const SEARCH_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFilter {
    pub filter: ViewFilter,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTemplate {
    pub name: String,
    pub metrics: Vec<String>,
    pub charts: Vec<String>,
    pub format: ExportFormat,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
            Frequency::Quarterly => "Quarterly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            other => Err(format!("unknown frequency: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledReport {
    pub name: String,
    pub template: String,
    pub frequency: Frequency,
    pub time: NaiveTime,
    pub recipients: Vec<String>,
    pub format: ExportFormat,
    /// Display text only; never computed from a clock.
    pub next_run: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    pub format: ExportFormat,
    pub created_at: NaiveDateTime,
    pub record_count: usize,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    search_history: Vec<String>,
    active_filter: ViewFilter,
    saved_filters: BTreeMap<String, SavedFilter>,
    report_templates: BTreeMap<String, ReportTemplate>,
    scheduled_reports: Vec<ScheduledReport>,
    library: Vec<LibraryEntry>,
    applications: ApplicationTracker,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // --- search history ---

    /// Record a query at the front of the history. Repeats move to the front;
    /// blank queries are ignored.
    pub fn record_search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.search_history.retain(|q| q != query);
        self.search_history.insert(0, query.to_string());
        self.search_history.truncate(SEARCH_HISTORY_LIMIT);
    }

    /// Most recent first.
    pub fn search_history(&self) -> &[String] {
        &self.search_history
    }

    pub fn clear_search_history(&mut self) {
        self.search_history.clear();
    }

    // --- filters ---

    pub fn active_filter(&self) -> &ViewFilter {
        &self.active_filter
    }

    pub fn set_active_filter(&mut self, filter: ViewFilter) {
        self.active_filter = filter;
    }

    pub fn clear_filters(&mut self) {
        self.active_filter = ViewFilter::default();
    }

    /// Save the active filter under `name`, replacing any previous set.
    pub fn save_filter(&mut self, name: &str) -> Result<(), StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Other("filter set name is empty".into()));
        }
        let saved = SavedFilter {
            filter: self.active_filter.clone(),
            created_at: now(),
        };
        self.saved_filters.insert(name.to_string(), saved);
        debug!(name, "saved filter set");
        Ok(())
    }

    /// Make a saved set the active filter.
    pub fn load_filter(&mut self, name: &str) -> Result<&ViewFilter, StoreError> {
        let saved = self
            .saved_filters
            .get(name)
            .ok_or_else(|| StoreError::NotFound(format!("filter set {name}")))?;
        self.active_filter = saved.filter.clone();
        Ok(&self.active_filter)
    }

    pub fn delete_filter(&mut self, name: &str) -> bool {
        self.saved_filters.remove(name).is_some()
    }

    /// Saved sets in name order.
    pub fn saved_filters(&self) -> impl Iterator<Item = (&str, &SavedFilter)> {
        self.saved_filters.iter().map(|(k, v)| (k.as_str(), v))
    }

    // --- report templates ---

    /// Save or replace a template. Metric and chart names must be ones
    /// [`report::METRICS`] and [`report::CHARTS`] know.
    pub fn save_template(
        &mut self,
        name: &str,
        metrics: Vec<String>,
        charts: Vec<String>,
        format: ExportFormat,
    ) -> Result<&ReportTemplate, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Other("template name is empty".into()));
        }
        report::validate_names(&metrics, &charts)?;
        let template = ReportTemplate {
            name: name.to_string(),
            metrics,
            charts,
            format,
            created_at: now(),
        };
        self.report_templates.insert(name.to_string(), template);
        Ok(&self.report_templates[name])
    }

    pub fn template(&self, name: &str) -> Result<&ReportTemplate, StoreError> {
        self.report_templates
            .get(name)
            .ok_or_else(|| StoreError::NotFound(format!("report template {name}")))
    }

    pub fn templates(&self) -> impl Iterator<Item = &ReportTemplate> {
        self.report_templates.values()
    }

    pub fn delete_template(&mut self, name: &str) -> bool {
        self.report_templates.remove(name).is_some()
    }

    // --- scheduled reports ---

    /// Register a schedule. Needs a name and at least one recipient; blank
    /// recipient lines are dropped.
    pub fn schedule_report(
        &mut self,
        name: &str,
        template: &str,
        frequency: Frequency,
        time: NaiveTime,
        recipients: &[&str],
        format: ExportFormat,
    ) -> Result<&ScheduledReport, StoreError> {
        let name = name.trim();
        let recipients: Vec<String> = recipients
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();
        if name.is_empty() || recipients.is_empty() {
            return Err(StoreError::Other(
                "scheduled report needs a name and at least one recipient".into(),
            ));
        }
        let report = ScheduledReport {
            name: name.to_string(),
            template: template.to_string(),
            frequency,
            time,
            next_run: next_run_text(frequency, time),
            recipients,
            format,
        };
        self.scheduled_reports.push(report);
        Ok(&self.scheduled_reports[self.scheduled_reports.len() - 1])
    }

    pub fn scheduled_reports(&self) -> &[ScheduledReport] {
        &self.scheduled_reports
    }

    pub fn unschedule(&mut self, name: &str) -> bool {
        let before = self.scheduled_reports.len();
        self.scheduled_reports.retain(|r| r.name != name);
        self.scheduled_reports.len() != before
    }

    // --- report library ---

    /// Log a generated report. Newest entries come first.
    pub fn add_to_library(
        &mut self,
        name: &str,
        format: ExportFormat,
        record_count: usize,
        tags: Vec<String>,
    ) -> &LibraryEntry {
        self.library.insert(
            0,
            LibraryEntry {
                name: name.to_string(),
                format,
                created_at: now(),
                record_count,
                tags,
            },
        );
        &self.library[0]
    }

    pub fn library(&self) -> &[LibraryEntry] {
        &self.library
    }

    /// Case-insensitive match on name or any tag.
    pub fn search_library(&self, query: &str) -> Vec<&LibraryEntry> {
        let q = query.trim().to_lowercase();
        self.library
            .iter()
            .filter(|e| {
                q.is_empty()
                    || e.name.to_lowercase().contains(&q)
                    || e.tags.iter().any(|t| t.to_lowercase().contains(&q))
            })
            .collect()
    }

    pub fn remove_from_library(&mut self, name: &str) -> bool {
        let before = self.library.len();
        self.library.retain(|e| e.name != name);
        self.library.len() != before
    }

    // --- application tracker ---

    pub fn applications(&self) -> &ApplicationTracker {
        &self.applications
    }

    pub fn applications_mut(&mut self) -> &mut ApplicationTracker {
        &mut self.applications
    }
}

fn next_run_text(frequency: Frequency, time: NaiveTime) -> String {
    let at = time.format("%H:%M");
    match frequency {
        Frequency::Daily => format!("tomorrow at {at}"),
        Frequency::Weekly => format!("next week at {at}"),
        Frequency::Monthly => format!("1st of next month at {at}"),
        Frequency::Quarterly => format!("start of next quarter at {at}"),
    }
}
