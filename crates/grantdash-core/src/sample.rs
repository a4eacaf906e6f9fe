//! Synthetic grant records for demos and as the ingestion fallback.
//!
//! Output is demo data only. With a seed it is reproducible for a given
//! `today`; without one it is seeded from the OS.

use chrono::{Datelike, Duration, NaiveDate};
use rand::prelude::*;
use rand::seq::IndexedRandom;
use tracing::debug;

use crate::catalog::{self, GrantCatalogEntry};
use crate::record::{Eligibility, GrantRecord, GrantStatus};

/// Records generated per catalog entry.
pub const RECORDS_PER_TYPE: usize = 3;

pub const SAMPLE_ROWS: usize = RECORDS_PER_TYPE * catalog::CATALOG.len();

pub const AGENCIES: &[&str] = &["SBA", "NSF", "NIH", "DOE", "USDA", "HUD", "EPA", "HHS"];

pub const STATES: &[&str] = &["CA", "TX", "NY", "FL", "IL", "PA", "OH", "GA", "NC", "MI"];

pub const INDUSTRIES: &[&str] = &[
    "Technology",
    "Healthcare",
    "Manufacturing",
    "Education",
    "Agriculture",
    "Energy",
    "Arts",
    "Non-profit",
];

const MAX_POSTED_AGO_DAYS: i64 = 90;
const MIN_RESPONSE_DAYS: i64 = 30;
const MAX_RESPONSE_DAYS: i64 = 180;

/// Generate [`SAMPLE_ROWS`] records, [`RECORDS_PER_TYPE`] per catalog entry,
/// in catalog order.
pub fn generate(seed: Option<u64>, today: NaiveDate) -> Vec<GrantRecord> {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };

    let mut records = Vec::with_capacity(SAMPLE_ROWS);
    for entry in catalog::entries() {
        for _ in 0..RECORDS_PER_TYPE {
            let seq = records.len() + 1;
            records.push(sample_record(&mut rng, entry, seq, today));
        }
    }
    debug!(rows = records.len(), ?seed, "generated sample records");
    records
}

fn sample_record(
    rng: &mut StdRng,
    entry: &GrantCatalogEntry,
    seq: usize,
    today: NaiveDate,
) -> GrantRecord {
    let (award_floor, funding, award_ceiling) = funding_triple(rng, entry);

    let posted = today - Duration::days(rng.random_range(0..=MAX_POSTED_AGO_DAYS));
    let response = today + Duration::days(rng.random_range(MIN_RESPONSE_DAYS..=MAX_RESPONSE_DAYS));

    let agency = pick(rng, AGENCIES);
    let status = GrantStatus::KNOWN
        .choose(rng)
        .cloned()
        .unwrap_or(GrantStatus::New);
    let eligibility = if rng.random_bool(0.5) {
        Eligibility::Yes
    } else {
        Eligibility::No
    };

    GrantRecord {
        grant_type: entry.name.to_string(),
        opportunity_number: opportunity_number(entry.name, today.year(), seq),
        status,
        eligibility,
        funding: Some(funding),
        award_ceiling: Some(award_ceiling),
        award_floor: Some(award_floor),
        posted_date: Some(posted),
        response_date: Some(response),
        agency: agency.to_string(),
        agency_email: format!("grants@{}.gov", agency.to_ascii_lowercase()),
        agency_phone: format!("202-555-{:04}", rng.random_range(0..10_000)),
        client: format!("Client {seq}"),
        email: format!("client{seq}@example.com"),
        phone: format!(
            "555-{:03}-{:04}",
            rng.random_range(100..1000),
            rng.random_range(1000..10_000)
        ),
        business: format!("Business {seq}"),
        industry: pick(rng, INDUSTRIES).to_string(),
        state: pick(rng, STATES).to_string(),
        country: "USA".to_string(),
        address: format!("{} Main St", rng.random_range(100..10_000)),
    }
}

/// Draw `(floor, funding, ceiling)` with `floor <= funding <= ceiling`.
///
/// The floor comes from `[avg/10, avg]`, the ceiling from `[avg, max]`, and
/// funding from between the two.
fn funding_triple(rng: &mut StdRng, entry: &GrantCatalogEntry) -> (i64, i64, i64) {
    let avg = entry.avg_amount;
    let floor = rng.random_range((avg / 10).max(1)..=avg);
    let ceiling = rng.random_range(avg..=entry.max_amount.max(avg));
    let funding = rng.random_range(floor..=ceiling);
    (floor, funding, ceiling)
}

fn pick(rng: &mut StdRng, options: &[&'static str]) -> &'static str {
    options.choose(rng).copied().unwrap_or_default()
}

/// `GRANT-<TYPE3>-<YEAR>-<SEQ3>`.
pub fn opportunity_number(grant_type: &str, year: i32, seq: usize) -> String {
    let mut code: String = grant_type
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    while code.len() < 3 {
        code.push('X');
    }
    format!("GRANT-{code}-{year}-{seq:03}")
}
