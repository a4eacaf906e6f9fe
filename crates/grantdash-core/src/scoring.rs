//! Opportunity scoring and deadline urgency.
//!
//! Every function here is pure: `today` is always passed in, so the same
//! record scored on the same day yields the same result. Missing or malformed
//! fields degrade to a zero contribution; nothing in this module fails.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::days_until;
use crate::record::{GrantRecord, GrantStatus};

pub const ELIGIBILITY_WEIGHT: u8 = 30;
pub const STATUS_WEIGHT: u8 = 20;
pub const DEADLINE_WEIGHT: u8 = 20;
pub const FUNDING_WEIGHT: u8 = 30;

/// Days left at or below which a deadline is urgent.
pub const URGENT_DAYS: i64 = 7;
/// Days left at or below which a deadline needs attention.
pub const WARNING_DAYS: i64 = 30;

/// Coarse classification of how soon a response is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Urgency {
    Urgent,
    Warning,
    Safe,
    Unknown,
}

impl Urgency {
    pub const ALL: [Urgency; 4] = [
        Urgency::Urgent,
        Urgency::Warning,
        Urgency::Safe,
        Urgency::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Urgent => "Urgent",
            Urgency::Warning => "Warning",
            Urgency::Safe => "Safe",
            Urgency::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human label plus urgency bucket for a response deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlineStatus {
    pub label: String,
    pub urgency: Urgency,
}

/// A record annotated with its derived fields. Built on demand, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredGrantRecord<'a> {
    #[serde(flatten)]
    pub record: &'a GrantRecord,
    pub opportunity_score: u8,
    pub deadline: DeadlineStatus,
    pub progress: f64,
}

impl<'a> ScoredGrantRecord<'a> {
    pub fn new(record: &'a GrantRecord, today: NaiveDate) -> Self {
        Self {
            record,
            opportunity_score: calculate_grant_score(record, today),
            deadline: classify_deadline(record.posted_date, record.response_date, today),
            progress: progress(record.posted_date, record.response_date, today),
        }
    }

    /// Days until the response deadline, if known.
    pub fn days_left(&self, today: NaiveDate) -> Option<i64> {
        self.record.response_date.map(|d| days_until(d, today))
    }
}

/// Score every record against the same `today`.
pub fn score_all(records: &[GrantRecord], today: NaiveDate) -> Vec<ScoredGrantRecord<'_>> {
    records
        .iter()
        .map(|r| ScoredGrantRecord::new(r, today))
        .collect()
}

/// Opportunity score in `0..=100`: eligibility, status, deadline proximity
/// and funding magnitude, summed.
pub fn calculate_grant_score(record: &GrantRecord, today: NaiveDate) -> u8 {
    let total = eligibility_points(record)
        + status_points(&record.status)
        + deadline_points(record.response_date, today)
        + funding_points(record.funding);
    total.min(100)
}

fn eligibility_points(record: &GrantRecord) -> u8 {
    if record.eligibility.is_yes() {
        ELIGIBILITY_WEIGHT
    } else {
        0
    }
}

fn status_points(status: &GrantStatus) -> u8 {
    match status {
        GrantStatus::Interested => STATUS_WEIGHT,
        GrantStatus::UnderReview => 15,
        GrantStatus::New => 10,
        GrantStatus::NotInterested | GrantStatus::Other(_) => 0,
    }
}

fn deadline_points(response: Option<NaiveDate>, today: NaiveDate) -> u8 {
    let Some(response) = response else {
        return 0;
    };
    match days_until(response, today) {
        d if d > 90 => DEADLINE_WEIGHT,
        d if d > WARNING_DAYS => 15,
        d if d > URGENT_DAYS => 10,
        _ => 5,
    }
}

fn funding_points(funding: Option<i64>) -> u8 {
    let Some(funding) = funding else {
        return 0;
    };
    match funding {
        f if f >= 1_000_000 => FUNDING_WEIGHT,
        f if f >= 500_000 => 25,
        f if f >= 250_000 => 20,
        f if f >= 100_000 => 15,
        _ => 10,
    }
}

/// Classify a response deadline relative to `today`.
///
/// `posted` does not affect the bucket; it is accepted so callers can pass a
/// record's date pair unchanged.
pub fn classify_deadline(
    _posted: Option<NaiveDate>,
    response: Option<NaiveDate>,
    today: NaiveDate,
) -> DeadlineStatus {
    let Some(response) = response else {
        return DeadlineStatus {
            label: "N/A".to_string(),
            urgency: Urgency::Unknown,
        };
    };

    let days = days_until(response, today);
    let (label, urgency) = match days {
        d if d < 0 => ("Deadline passed".to_string(), Urgency::Urgent),
        0 => ("Due today (0 days left)".to_string(), Urgency::Urgent),
        1 => ("1 day left".to_string(), Urgency::Urgent),
        d if d <= URGENT_DAYS => (format!("{d} days left"), Urgency::Urgent),
        d if d <= WARNING_DAYS => (format!("{d} days left"), Urgency::Warning),
        d => (format!("{d} days left"), Urgency::Safe),
    };
    DeadlineStatus { label, urgency }
}

/// Percentage of the posted→response window that has elapsed, in `0..=100`.
///
/// Returns `0.0` when either date is missing or the window is empty or inverted.
pub fn progress(posted: Option<NaiveDate>, response: Option<NaiveDate>, today: NaiveDate) -> f64 {
    let (Some(posted), Some(response)) = (posted, response) else {
        return 0.0;
    };
    if posted >= response {
        return 0.0;
    }
    let total = (response - posted).num_days() as f64;
    let elapsed = (today - posted).num_days() as f64;
    (elapsed / total * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Eligibility;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn record(
        eligibility: Eligibility,
        status: GrantStatus,
        funding: Option<i64>,
        days_left: Option<i64>,
    ) -> GrantRecord {
        GrantRecord {
            eligibility,
            status,
            funding,
            response_date: days_left.map(|d| today() + Duration::days(d)),
            ..Default::default()
        }
    }

    #[test]
    fn best_case_scores_exactly_100() {
        let r = record(
            Eligibility::Yes,
            GrantStatus::Interested,
            Some(2_000_000),
            Some(100),
        );
        assert_eq!(calculate_grant_score(&r, today()), 100);
    }

    #[test]
    fn ineligible_never_exceeds_70() {
        for status in GrantStatus::KNOWN {
            for funding in [None, Some(0), Some(150_000), Some(5_000_000)] {
                for days in [None, Some(-5), Some(3), Some(20), Some(60), Some(365)] {
                    let r = record(Eligibility::No, status.clone(), funding, days);
                    let score = calculate_grant_score(&r, today());
                    assert!(score <= 70, "{status:?} {funding:?} {days:?} scored {score}");
                }
            }
        }
    }

    #[test]
    fn missing_deadline_caps_at_80() {
        let r = record(
            Eligibility::Yes,
            GrantStatus::Interested,
            Some(2_000_000),
            None,
        );
        assert_eq!(calculate_grant_score(&r, today()), 80);
        let status = classify_deadline(None, r.response_date, today());
        assert_eq!(status.urgency, Urgency::Unknown);
        assert_eq!(status.label, "N/A");
    }

    #[test]
    fn status_weights() {
        let score = |s: GrantStatus| {
            calculate_grant_score(&record(Eligibility::No, s, None, None), today())
        };
        assert_eq!(score(GrantStatus::Interested), 20);
        assert_eq!(score(GrantStatus::UnderReview), 15);
        assert_eq!(score(GrantStatus::New), 10);
        assert_eq!(score(GrantStatus::NotInterested), 0);
        assert_eq!(score(GrantStatus::Other("Approved".into())), 0);
    }

    #[test]
    fn deadline_tiers() {
        let pts = |d: i64| deadline_points(Some(today() + Duration::days(d)), today());
        assert_eq!(pts(91), 20);
        assert_eq!(pts(90), 15);
        assert_eq!(pts(31), 15);
        assert_eq!(pts(30), 10);
        assert_eq!(pts(8), 10);
        assert_eq!(pts(7), 5);
        assert_eq!(pts(0), 5);
        assert_eq!(pts(-30), 5);
        assert_eq!(deadline_points(None, today()), 0);
    }

    #[test]
    fn funding_tiers() {
        assert_eq!(funding_points(Some(1_000_000)), 30);
        assert_eq!(funding_points(Some(999_999)), 25);
        assert_eq!(funding_points(Some(500_000)), 25);
        assert_eq!(funding_points(Some(250_000)), 20);
        assert_eq!(funding_points(Some(100_000)), 15);
        assert_eq!(funding_points(Some(99_999)), 10);
        assert_eq!(funding_points(Some(0)), 10);
        assert_eq!(funding_points(None), 0);
    }

    #[test]
    fn scoring_is_deterministic() {
        let r = record(Eligibility::Yes, GrantStatus::New, Some(300_000), Some(45));
        let first = calculate_grant_score(&r, today());
        for _ in 0..10 {
            assert_eq!(calculate_grant_score(&r, today()), first);
        }
        assert_eq!(first, 30 + 10 + 15 + 20);
    }

    #[test]
    fn classify_boundaries() {
        let at = |d: i64| classify_deadline(None, Some(today() + Duration::days(d)), today());
        assert_eq!(at(7).urgency, Urgency::Urgent);
        assert_eq!(at(7).label, "7 days left");
        assert_eq!(at(8).urgency, Urgency::Warning);
        assert_eq!(at(30).urgency, Urgency::Warning);
        assert_eq!(at(31).urgency, Urgency::Safe);
        assert_eq!(at(0).label, "Due today (0 days left)");
        assert_eq!(at(1).label, "1 day left");
    }

    #[test]
    fn passed_deadline_is_urgent() {
        let status = classify_deadline(None, Some(today() - Duration::days(3)), today());
        assert_eq!(status.urgency, Urgency::Urgent);
        assert_eq!(status.label, "Deadline passed");
    }

    #[test]
    fn progress_midpoint_and_clamps() {
        let posted = Some(today() - Duration::days(10));
        let response = Some(today() + Duration::days(10));
        assert_eq!(progress(posted, response, today()), 50.0);

        let later = today() + Duration::days(30);
        assert_eq!(progress(posted, response, later), 100.0);
        let earlier = today() - Duration::days(30);
        assert_eq!(progress(posted, response, earlier), 0.0);
    }

    #[test]
    fn progress_degenerate_windows() {
        let d = Some(today());
        assert_eq!(progress(d, d, today()), 0.0);
        assert_eq!(progress(Some(today() + Duration::days(5)), d, today()), 0.0);
        assert_eq!(progress(None, d, today()), 0.0);
        assert_eq!(progress(d, None, today()), 0.0);
    }

    #[test]
    fn progress_is_monotonic() {
        let posted = Some(today());
        let response = Some(today() + Duration::days(40));
        let mut last = -1.0;
        for offset in -5..50 {
            let p = progress(posted, response, today() + Duration::days(offset));
            assert!((0.0..=100.0).contains(&p));
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn scored_record_carries_derived_fields() {
        let r = record(Eligibility::Yes, GrantStatus::UnderReview, Some(50_000), Some(5));
        let scored = ScoredGrantRecord::new(&r, today());
        assert_eq!(scored.opportunity_score, 30 + 15 + 5 + 10);
        assert_eq!(scored.deadline.urgency, Urgency::Urgent);
        assert_eq!(scored.days_left(today()), Some(5));
    }
}
