//! Application tracker: the grants a user has actually applied for.
//!
//! Separate from the opportunity table. Entries are added by hand during a
//! session and summarised by status and by grant type.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Draft,
        ApplicationStatus::Submitted,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "Draft",
            ApplicationStatus::Submitted => "Submitted",
            ApplicationStatus::UnderReview => "Under Review",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "draft" => Ok(ApplicationStatus::Draft),
            "submitted" => Ok(ApplicationStatus::Submitted),
            "underreview" => Ok(ApplicationStatus::UnderReview),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(format!("unknown application status: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub grant_type: String,
    pub amount_requested: i64,
    pub application_date: NaiveDate,
    pub deadline: NaiveDate,
    pub status: ApplicationStatus,
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationTracker {
    applications: Vec<Application>,
}

impl ApplicationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an application. Names must be non-empty and unique; amounts
    /// cannot be negative.
    pub fn add(&mut self, app: Application) -> Result<&Application, StoreError> {
        let name = app.name.trim();
        if name.is_empty() {
            return Err(StoreError::Other("application name is empty".into()));
        }
        if app.amount_requested < 0 {
            return Err(StoreError::Other(format!("amount requested for {name} is negative")));
        }
        if self.applications.iter().any(|a| a.name == name) {
            return Err(StoreError::Other(format!("application {name} already exists")));
        }
        let app = Application {
            name: name.to_string(),
            ..app
        };
        debug!(name = %app.name, status = %app.status, "tracked application");
        self.applications.push(app);
        Ok(&self.applications[self.applications.len() - 1])
    }

    /// In insertion order.
    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn set_status(&mut self, name: &str, status: ApplicationStatus) -> Result<(), StoreError> {
        let app = self
            .applications
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| StoreError::NotFound(format!("application {name}")))?;
        app.status = status;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.applications.len();
        self.applications.retain(|a| a.name != name);
        self.applications.len() != before
    }

    /// Applications in any of `statuses`; an empty list keeps everything.
    pub fn filter(&self, statuses: &[ApplicationStatus]) -> Vec<&Application> {
        self.applications
            .iter()
            .filter(|a| statuses.is_empty() || statuses.contains(&a.status))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackerMetrics {
    pub total: usize,
    pub approved: usize,
    pub total_requested: i64,
    /// Approved share as a percentage; zero when nothing is tracked.
    pub success_rate: f64,
}

impl TrackerMetrics {
    pub fn compute(apps: &[&Application]) -> Self {
        let total = apps.len();
        let approved = apps
            .iter()
            .filter(|a| a.status == ApplicationStatus::Approved)
            .count();
        let total_requested = apps
            .iter()
            .fold(0i64, |acc, a| acc.saturating_add(a.amount_requested));
        let success_rate = if total == 0 {
            0.0
        } else {
            approved as f64 / total as f64 * 100.0
        };
        Self {
            total,
            approved,
            total_requested,
            success_rate,
        }
    }
}

/// Counts per status in lifecycle order; statuses with no applications are
/// left out.
pub fn status_counts(apps: &[&Application]) -> Vec<(ApplicationStatus, usize)> {
    ApplicationStatus::ALL
        .iter()
        .map(|st| (*st, apps.iter().filter(|a| a.status == *st).count()))
        .filter(|(_, n)| *n > 0)
        .collect()
}

/// Requested amount per grant type, alphabetical.
pub fn requested_by_type(apps: &[&Application]) -> Vec<(String, i64)> {
    let mut sums: BTreeMap<&str, i64> = BTreeMap::new();
    for a in apps {
        let sum = sums.entry(a.grant_type.as_str()).or_default();
        *sum = sum.saturating_add(a.amount_requested);
    }
    sums.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
