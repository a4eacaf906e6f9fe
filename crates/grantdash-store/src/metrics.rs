//! Dashboard aggregates and chart series.
//!
//! Everything here is a pure function of the scored rows; charts are returned
//! as labelled series and left to the presentation layer to draw.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use grantdash_core::{GrantRecord, GrantStatus, ScoredGrantRecord, Urgency};
use serde::Serialize;

use crate::view::FundingBand;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub total_records: usize,
    pub grant_types: usize,
    pub clients: usize,
    pub states: usize,
    pub total_funding: i64,
    /// Mean over records with a known funding amount.
    pub average_funding: Option<f64>,
    pub eligible: usize,
    /// Eligible share in `0.0..=1.0`; zero for an empty view.
    pub eligible_rate: f64,
    pub average_score: Option<f64>,
    pub by_status: Vec<(String, usize)>,
    pub by_urgency: Vec<(Urgency, usize)>,
    pub top_industry: Option<String>,
}

impl DashboardMetrics {
    pub fn compute(rows: &[ScoredGrantRecord<'_>]) -> Self {
        let total_records = rows.len();
        if total_records == 0 {
            return Self {
                by_urgency: Urgency::ALL.iter().map(|u| (*u, 0)).collect(),
                ..Default::default()
            };
        }

        // Sheet amounts are unbounded, so sums saturate and the mean is taken in f64.
        let funded: Vec<i64> = rows.iter().filter_map(|s| s.record.funding).collect();
        let total_funding = funded.iter().fold(0i64, |acc, f| acc.saturating_add(*f));
        let average_funding = (!funded.is_empty())
            .then(|| funded.iter().map(|f| *f as f64).sum::<f64>() / funded.len() as f64);

        let eligible = rows.iter().filter(|s| s.record.eligibility.is_yes()).count();
        let score_sum: u64 = rows.iter().map(|s| u64::from(s.opportunity_score)).sum();

        let by_urgency = Urgency::ALL
            .iter()
            .map(|u| (*u, rows.iter().filter(|s| s.deadline.urgency == *u).count()))
            .collect();

        Self {
            total_records,
            grant_types: distinct(rows, |r| r.grant_type.as_str()),
            clients: distinct(rows, |r| r.client.as_str()),
            states: distinct(rows, |r| r.state.as_str()),
            total_funding,
            average_funding,
            eligible,
            eligible_rate: eligible as f64 / total_records as f64,
            average_score: Some(score_sum as f64 / total_records as f64),
            by_status: status_distribution(rows),
            by_urgency,
            top_industry: count_by(rows, |r| r.industry.as_str())
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
                .map(|(k, _)| k),
        }
    }
}

/// Counts per status: the four known statuses in fixed order (zeros kept),
/// then any other values alphabetically.
pub fn status_distribution(rows: &[ScoredGrantRecord<'_>]) -> Vec<(String, usize)> {
    let mut known: Vec<(String, usize)> = GrantStatus::KNOWN
        .iter()
        .map(|st| {
            let n = rows.iter().filter(|s| &s.record.status == st).count();
            (st.as_str().to_string(), n)
        })
        .collect();
    let mut other: BTreeMap<String, usize> = BTreeMap::new();
    for s in rows {
        if let GrantStatus::Other(raw) = &s.record.status {
            let label = if raw.is_empty() { "Unknown" } else { raw.as_str() };
            *other.entry(label.to_string()).or_default() += 1;
        }
    }
    known.extend(other);
    known
}

/// Sum of known funding per grant type, largest first.
pub fn funding_by_grant_type(rows: &[ScoredGrantRecord<'_>]) -> Vec<(String, i64)> {
    let mut sums: HashMap<&str, i64> = HashMap::new();
    for s in rows {
        if let Some(f) = s.record.funding {
            let sum = sums.entry(s.record.grant_type.as_str()).or_default();
            *sum = sum.saturating_add(f);
        }
    }
    let mut out: Vec<(String, i64)> = sums
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Record counts per funding band, every band present. Unfunded records
/// are not counted.
pub fn funding_histogram(rows: &[ScoredGrantRecord<'_>]) -> Vec<(FundingBand, usize)> {
    FundingBand::ALL
        .iter()
        .map(|band| {
            let n = rows
                .iter()
                .filter(|s| s.record.funding.map(FundingBand::of) == Some(*band))
                .count();
            (*band, n)
        })
        .collect()
}

/// Response deadlines per calendar month (`YYYY-MM`), chronological.
pub fn deadlines_by_month(rows: &[ScoredGrantRecord<'_>]) -> Vec<(String, usize)> {
    let mut months: BTreeMap<String, usize> = BTreeMap::new();
    for d in rows.iter().filter_map(|s| s.record.response_date) {
        *months.entry(d.format("%Y-%m").to_string()).or_default() += 1;
    }
    months.into_iter().collect()
}

pub fn records_by_state(rows: &[ScoredGrantRecord<'_>]) -> Vec<(String, usize)> {
    count_by(rows, |r| r.state.as_str())
}

pub fn records_by_industry(rows: &[ScoredGrantRecord<'_>]) -> Vec<(String, usize)> {
    count_by(rows, |r| r.industry.as_str())
}

fn distinct(rows: &[ScoredGrantRecord<'_>], key: impl Fn(&GrantRecord) -> &str) -> usize {
    rows.iter()
        .map(|s| key(s.record))
        .filter(|k| !k.is_empty())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Non-empty values with their counts, most frequent first, ties by name.
fn count_by(
    rows: &[ScoredGrantRecord<'_>],
    key: impl Fn(&GrantRecord) -> &str,
) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for s in rows {
        let k = key(s.record);
        if !k.is_empty() {
            *counts.entry(k).or_default() += 1;
        }
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use grantdash_core::scoring::score_all;
    use grantdash_core::{Eligibility, sample};

    use crate::read_grant_csv;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn fixture() -> Vec<GrantRecord> {
        let d = |m, day| NaiveDate::from_ymd_opt(2026, m, day);
        vec![
            GrantRecord {
                grant_type: "Pell Grants".into(),
                client: "A".into(),
                state: "CA".into(),
                industry: "Education".into(),
                status: GrantStatus::Interested,
                eligibility: Eligibility::Yes,
                funding: Some(10_000),
                response_date: d(3, 5),
                ..Default::default()
            },
            GrantRecord {
                grant_type: "Pell Grants".into(),
                client: "B".into(),
                state: "CA".into(),
                industry: "Education".into(),
                status: GrantStatus::New,
                funding: Some(30_000),
                response_date: d(3, 20),
                ..Default::default()
            },
            GrantRecord {
                grant_type: "Arts & Culture Grants".into(),
                client: "B".into(),
                state: "TX".into(),
                industry: "Arts".into(),
                status: GrantStatus::Other("On Hold".into()),
                funding: None,
                response_date: d(5, 1),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn overview_metrics() {
        let records = fixture();
        let m = DashboardMetrics::compute(&score_all(&records, today()));
        assert_eq!(m.total_records, 3);
        assert_eq!(m.grant_types, 2);
        assert_eq!(m.clients, 2);
        assert_eq!(m.states, 2);
        assert_eq!(m.total_funding, 40_000);
        assert_eq!(m.average_funding, Some(20_000.0));
        assert_eq!(m.eligible, 1);
        assert!((m.eligible_rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.top_industry.as_deref(), Some("Education"));
        let urgent = m.by_urgency.iter().find(|(u, _)| *u == Urgency::Urgent).unwrap();
        assert_eq!(urgent.1, 1);
    }

    #[test]
    fn empty_view_has_zeroed_metrics() {
        let m = DashboardMetrics::compute(&[]);
        assert_eq!(m.total_records, 0);
        assert_eq!(m.average_score, None);
        assert_eq!(m.average_funding, None);
        assert_eq!(m.eligible_rate, 0.0);
        assert_eq!(m.by_urgency.len(), 4);
    }

    #[test]
    fn status_distribution_keeps_known_order() {
        let records = fixture();
        let dist = status_distribution(&score_all(&records, today()));
        let labels: Vec<&str> = dist.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(
            labels,
            vec!["New", "Under Review", "Interested", "Not Interested", "On Hold"]
        );
        assert_eq!(dist[1].1, 0);
    }

    #[test]
    fn chart_series() {
        let records = fixture();
        let rows = score_all(&records, today());

        assert_eq!(
            funding_by_grant_type(&rows),
            vec![("Pell Grants".to_string(), 40_000)]
        );

        let hist = funding_histogram(&rows);
        assert_eq!(hist.len(), 6);
        assert_eq!(hist[0], (FundingBand::UpTo25K, 1));
        assert_eq!(hist[1], (FundingBand::UpTo50K, 1));

        assert_eq!(
            deadlines_by_month(&rows),
            vec![("2026-03".to_string(), 2), ("2026-05".to_string(), 1)]
        );
        assert_eq!(records_by_state(&rows)[0], ("CA".to_string(), 2));
        assert_eq!(records_by_industry(&rows).len(), 2);
    }

    #[test]
    fn histogram_totals_match_funded_sample_rows() {
        let records = sample::generate(Some(3), today());
        let rows = score_all(&records, today());
        let total: usize = funding_histogram(&rows).iter().map(|(_, n)| n).sum();
        assert_eq!(total, rows.len());
    }

    #[test]
    fn huge_sheet_amounts_saturate() {
        let csv = "\
Grant Type,Funding,Client
Pell Grants,\"$9,000,000,000,000,000,000\",A
Pell Grants,\"$9,000,000,000,000,000,000\",B
";
        let table = read_grant_csv(csv.as_bytes()).unwrap();
        let rows = table.scored(today());

        let m = DashboardMetrics::compute(&rows);
        assert_eq!(m.total_funding, i64::MAX);
        assert_eq!(m.average_funding, Some(9e18));
        assert_eq!(
            funding_by_grant_type(&rows),
            vec![("Pell Grants".to_string(), i64::MAX)]
        );
        assert_eq!(funding_histogram(&rows)[5], (FundingBand::Over500K, 2));
    }
}
