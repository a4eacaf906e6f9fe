//! Grant records as they flow through ingestion, scoring and display.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Pipeline status of a grant record.
///
/// Source sheets carry free text here. Anything that is not one of the four
/// known statuses is kept verbatim in [`GrantStatus::Other`] so it can be
/// displayed and exported unchanged; it carries no scoring weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum GrantStatus {
    New,
    UnderReview,
    Interested,
    NotInterested,
    Other(String),
}

impl GrantStatus {
    /// The four recognised statuses in display order.
    pub const KNOWN: [GrantStatus; 4] = [
        GrantStatus::New,
        GrantStatus::UnderReview,
        GrantStatus::Interested,
        GrantStatus::NotInterested,
    ];

    /// Parse free text. Case, whitespace, `-` and `_` are ignored.
    pub fn parse(raw: &str) -> Self {
        let key: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "new" => GrantStatus::New,
            "underreview" => GrantStatus::UnderReview,
            "interested" => GrantStatus::Interested,
            "notinterested" => GrantStatus::NotInterested,
            _ => GrantStatus::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GrantStatus::New => "New",
            GrantStatus::UnderReview => "Under Review",
            GrantStatus::Interested => "Interested",
            GrantStatus::NotInterested => "Not Interested",
            GrantStatus::Other(s) => s,
        }
    }
}

impl Default for GrantStatus {
    fn default() -> Self {
        GrantStatus::Other(String::new())
    }
}

impl fmt::Display for GrantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for GrantStatus {
    fn from(value: String) -> Self {
        GrantStatus::parse(&value)
    }
}

impl From<GrantStatus> for String {
    fn from(value: GrantStatus) -> Self {
        value.as_str().to_string()
    }
}

/// Whether the associated applicant is eligible for the opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Eligibility {
    Yes,
    #[default]
    No,
}

impl Eligibility {
    /// `yes`, `y`, `true`, `1` and `eligible` (any case) are `Yes`; everything else is `No`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "1" | "eligible" => Eligibility::Yes,
            _ => Eligibility::No,
        }
    }

    pub fn is_yes(self) -> bool {
        self == Eligibility::Yes
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Eligibility::Yes => "Yes",
            Eligibility::No => "No",
        }
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the working table: an opportunity plus the applicant it is tracked for.
///
/// Externally sourced rows make no promise about field consistency. In
/// particular `award_floor <= funding <= award_ceiling` only holds for
/// generated sample data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrantRecord {
    pub grant_type: String,
    pub opportunity_number: String,
    pub status: GrantStatus,
    pub eligibility: Eligibility,
    /// Whole dollars.
    pub funding: Option<i64>,
    pub award_ceiling: Option<i64>,
    pub award_floor: Option<i64>,
    pub posted_date: Option<NaiveDate>,
    pub response_date: Option<NaiveDate>,
    pub agency: String,
    pub agency_email: String,
    pub agency_phone: String,
    pub client: String,
    pub email: String,
    pub phone: String,
    pub business: String,
    pub industry: String,
    pub state: String,
    pub country: String,
    pub address: String,
}

/// Parse a dollar amount such as `$1,500,000`, `250000` or ` 75,000.00 `.
///
/// Fractional cents are truncated. Returns `None` for empty or non-numeric input.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(v) = cleaned.parse::<i64>() {
        return Some(v);
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.trunc() as i64)
}

/// Format whole dollars with thousands separators: `1250000` → `$1,250,000`.
pub fn format_dollars(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if amount < 0 {
        format!("-${out}")
    } else {
        format!("${out}")
    }
}
