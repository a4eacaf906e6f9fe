//! In-memory views over the scored table: filters, sorting, pagination and
//! search. Views never touch the underlying records.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use grantdash_core::catalog::{self, GrantCategory};
use grantdash_core::sample::INDUSTRIES;
use grantdash_core::{GrantRecord, GrantStatus, ScoredGrantRecord};
use serde::{Deserialize, Serialize};

/// Coarse funding ranges shared by the funding filter and the histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FundingBand {
    UpTo25K,
    UpTo50K,
    UpTo100K,
    UpTo250K,
    UpTo500K,
    Over500K,
}

impl FundingBand {
    pub const ALL: [FundingBand; 6] = [
        FundingBand::UpTo25K,
        FundingBand::UpTo50K,
        FundingBand::UpTo100K,
        FundingBand::UpTo250K,
        FundingBand::UpTo500K,
        FundingBand::Over500K,
    ];

    pub fn of(amount: i64) -> Self {
        match amount {
            a if a < 25_000 => FundingBand::UpTo25K,
            a if a < 50_000 => FundingBand::UpTo50K,
            a if a < 100_000 => FundingBand::UpTo100K,
            a if a < 250_000 => FundingBand::UpTo250K,
            a if a < 500_000 => FundingBand::UpTo500K,
            _ => FundingBand::Over500K,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FundingBand::UpTo25K => "$0-25K",
            FundingBand::UpTo50K => "$25K-50K",
            FundingBand::UpTo100K => "$50K-100K",
            FundingBand::UpTo250K => "$100K-250K",
            FundingBand::UpTo500K => "$250K-500K",
            FundingBand::Over500K => "$500K+",
        }
    }
}

impl fmt::Display for FundingBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FundingBand {
    type Err = String;

    /// Accepts the display label (`$100K-250K`) or its upper bound (`250k`, `500k+`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|b| {
                let label = b.label().to_ascii_lowercase();
                let upper = label.rsplit('-').next().unwrap_or(&label).trim_start_matches('$');
                key == label || key == upper || key.trim_start_matches('$') == upper
            })
            .ok_or_else(|| format!("unknown funding band: {s}"))
    }
}

/// Inclusive date range; either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// A missing date only passes an unconstrained range.
    fn admits(&self, date: Option<NaiveDate>) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(d) = date else {
            return false;
        };
        self.from.is_none_or(|f| d >= f) && self.to.is_none_or(|t| d <= t)
    }
}

/// UI-level filter selections. Every list is "any of"; an empty list means
/// no constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewFilter {
    pub statuses: Vec<GrantStatus>,
    pub grant_types: Vec<String>,
    pub categories: Vec<GrantCategory>,
    pub industries: Vec<String>,
    pub states: Vec<String>,
    pub funding_bands: (FundingBand, FundingBand),
    pub posted: DateRange,
    pub response: DateRange,
    pub eligible_only: bool,
    pub query: Option<String>,
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self {
            statuses: Vec::new(),
            grant_types: Vec::new(),
            categories: Vec::new(),
            industries: Vec::new(),
            states: Vec::new(),
            funding_bands: (FundingBand::UpTo25K, FundingBand::Over500K),
            posted: DateRange::default(),
            response: DateRange::default(),
            eligible_only: false,
            query: None,
        }
    }
}

impl ViewFilter {
    pub fn is_empty(&self) -> bool {
        *self == ViewFilter::default()
    }

    fn full_funding_range(&self) -> bool {
        let (lo, hi) = self.funding_bands;
        lo <= FundingBand::UpTo25K && hi >= FundingBand::Over500K
    }

    pub fn matches(&self, r: &GrantRecord) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&r.status) {
            return false;
        }
        if !self.grant_types.is_empty()
            && !self
                .grant_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(&r.grant_type))
        {
            return false;
        }
        if !self.categories.is_empty() {
            match catalog::category_of(&r.grant_type) {
                Some(c) if self.categories.contains(&c) => {}
                _ => return false,
            }
        }
        if !any_of_ci(&self.industries, &r.industry) || !any_of_ci(&self.states, &r.state) {
            return false;
        }
        if !self.full_funding_range() {
            let (lo, hi) = self.funding_bands;
            match r.funding.map(FundingBand::of) {
                Some(b) if b >= lo && b <= hi => {}
                _ => return false,
            }
        }
        if !self.posted.admits(r.posted_date) || !self.response.admits(r.response_date) {
            return false;
        }
        if self.eligible_only && !r.eligibility.is_yes() {
            return false;
        }
        match &self.query {
            Some(q) if !q.trim().is_empty() => matches_query(r, q),
            _ => true,
        }
    }

    /// Keep the scored rows this filter admits, preserving order.
    pub fn apply<'a>(&self, rows: Vec<ScoredGrantRecord<'a>>) -> Vec<ScoredGrantRecord<'a>> {
        rows.into_iter().filter(|s| self.matches(s.record)).collect()
    }

    /// Human-readable "chips" describing the active constraints.
    pub fn chips(&self) -> Vec<String> {
        let mut chips = Vec::new();
        chips.extend(self.statuses.iter().map(|s| format!("Status: {s}")));
        chips.extend(self.grant_types.iter().map(|t| format!("Grant type: {t}")));
        chips.extend(self.categories.iter().map(|c| format!("Category: {c}")));
        chips.extend(self.industries.iter().map(|i| format!("Industry: {i}")));
        chips.extend(self.states.iter().map(|s| format!("State: {s}")));
        if !self.full_funding_range() {
            let (lo, hi) = self.funding_bands;
            chips.push(format!("Funding: {lo} - {hi}"));
        }
        if self.eligible_only {
            chips.push("Eligible only".to_string());
        }
        if let Some(q) = &self.query {
            chips.push(format!("Search: {q}"));
        }
        chips
    }
}

fn any_of_ci(wanted: &[String], value: &str) -> bool {
    wanted.is_empty() || wanted.iter().any(|w| w.eq_ignore_ascii_case(value))
}

/// Case-insensitive substring match across the searchable text fields.
pub fn matches_query(r: &GrantRecord, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    [
        &r.grant_type,
        &r.opportunity_number,
        &r.client,
        &r.business,
        &r.industry,
        &r.agency,
        &r.state,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&q))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortKey {
    /// Highest score first; ties broken by soonest deadline.
    #[default]
    Score,
    Funding,
    Deadline,
    GrantType,
    Client,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "score" => Ok(SortKey::Score),
            "funding" => Ok(SortKey::Funding),
            "deadline" => Ok(SortKey::Deadline),
            "granttype" | "type" => Ok(SortKey::GrantType),
            "client" => Ok(SortKey::Client),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// Missing deadlines sort after every known one.
fn cmp_deadline(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort in place.
pub fn sort_scored(rows: &mut [ScoredGrantRecord<'_>], key: SortKey) {
    rows.sort_by(|a, b| match key {
        SortKey::Score => b
            .opportunity_score
            .cmp(&a.opportunity_score)
            .then_with(|| cmp_deadline(a.record.response_date, b.record.response_date)),
        SortKey::Funding => b.record.funding.cmp(&a.record.funding),
        SortKey::Deadline => cmp_deadline(a.record.response_date, b.record.response_date),
        SortKey::GrantType => a.record.grant_type.cmp(&b.record.grant_type),
        SortKey::Client => a.record.client.cmp(&b.record.client),
    });
}

/// One page of a longer listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slice `items` into 1-based pages. A zero page size is treated as one and
/// page zero as the first page. Pages past the end are empty.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let page = page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let items = items
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect();
    Page {
        items,
        page,
        page_size,
        total_items,
        total_pages,
    }
}

/// Up to three "Filter by …" / "Browse …" hints for a free-text query.
pub fn suggestions(query: &str) -> Vec<String> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return Vec::new();
    }
    let industries = INDUSTRIES
        .iter()
        .filter(|i| i.to_lowercase().contains(&q))
        .map(|i| format!("Filter by {i}"));
    let categories = GrantCategory::ALL
        .iter()
        .filter(|c| c.as_str().to_lowercase().contains(&q))
        .map(|c| format!("Browse {c}"));
    industries.chain(categories).take(3).collect()
}
