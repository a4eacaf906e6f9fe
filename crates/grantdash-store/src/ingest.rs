//! CSV ingestion with tolerant header mapping.
//!
//! Column names drift between sheets (`Grant Type`, `grant_type`, `Category`;
//! `client`, `Client Name`). Headers are folded to lower-case alphanumerics and
//! matched against alias lists. Unknown columns are ignored and missing ones
//! leave the field at its default, so only a header row is truly required.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};
use grantdash_core::record::parse_amount;
use grantdash_core::{Eligibility, GrantRecord, GrantStatus, parse_date};
use tracing::{debug, info};

use crate::{GrantTable, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    GrantType,
    OpportunityNumber,
    Status,
    Eligibility,
    Funding,
    AwardCeiling,
    AwardFloor,
    PostedDate,
    ResponseDate,
    Agency,
    AgencyEmail,
    AgencyPhone,
    Client,
    Email,
    Phone,
    Business,
    Industry,
    State,
    Country,
    Address,
}

/// Folded header → column. Order does not matter; aliases are unique.
const ALIASES: &[(&str, Column)] = &[
    ("granttype", Column::GrantType),
    ("grant", Column::GrantType),
    ("grantname", Column::GrantType),
    ("category", Column::GrantType),
    ("opportunitynumber", Column::OpportunityNumber),
    ("opportunityid", Column::OpportunityNumber),
    ("opportunity", Column::OpportunityNumber),
    ("status", Column::Status),
    ("eligibility", Column::Eligibility),
    ("eligible", Column::Eligibility),
    ("funding", Column::Funding),
    ("amount", Column::Funding),
    ("amountrequested", Column::Funding),
    ("estimatedfunding", Column::Funding),
    ("awardceiling", Column::AwardCeiling),
    ("awardfloor", Column::AwardFloor),
    ("posteddate", Column::PostedDate),
    ("postdate", Column::PostedDate),
    ("responsedate", Column::ResponseDate),
    ("deadline", Column::ResponseDate),
    ("closedate", Column::ResponseDate),
    ("agency", Column::Agency),
    ("agencyname", Column::Agency),
    ("agencyemail", Column::AgencyEmail),
    ("agencyphone", Column::AgencyPhone),
    ("client", Column::Client),
    ("clientname", Column::Client),
    ("email", Column::Email),
    ("phone", Column::Phone),
    ("phonenumber", Column::Phone),
    ("business", Column::Business),
    ("industry", Column::Industry),
    ("state", Column::State),
    ("country", Column::Country),
    ("address", Column::Address),
];

fn fold_header(h: &str) -> String {
    h.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn column_for(header: &str) -> Option<Column> {
    let key = fold_header(header);
    ALIASES.iter().find(|(alias, _)| *alias == key).map(|(_, c)| *c)
}

/// Read a CSV export into a [`GrantTable`].
///
/// The first row is the header. Rows whose fields are all blank are skipped.
/// Rows with more or fewer fields than the header are accepted; absent
/// trailing fields read as empty.
pub fn read_grant_csv<R: Read>(reader: R) -> Result<GrantTable, StoreError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mapping: Vec<Option<Column>> = headers.iter().map(column_for).collect();
    let recognised = mapping.iter().filter(|c| c.is_some()).count();
    debug!(columns = headers.len(), recognised, "mapped csv headers");

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        if row.iter().all(|f| f.is_empty()) {
            continue;
        }
        records.push(record_from_row(&row, &mapping));
    }

    info!(rows = records.len(), "parsed grant csv");
    Ok(GrantTable::new(records))
}

fn record_from_row(row: &StringRecord, mapping: &[Option<Column>]) -> GrantRecord {
    let mut rec = GrantRecord::default();
    for (i, value) in row.iter().enumerate() {
        let Some(Some(column)) = mapping.get(i) else {
            continue;
        };
        // First non-empty value wins when two headers map to the same field.
        match column {
            Column::GrantType => set_text(&mut rec.grant_type, value),
            Column::OpportunityNumber => set_text(&mut rec.opportunity_number, value),
            Column::Status => {
                if !value.is_empty() && rec.status == GrantStatus::default() {
                    rec.status = GrantStatus::parse(value);
                }
            }
            Column::Eligibility => {
                if !value.is_empty() {
                    rec.eligibility = Eligibility::parse(value);
                }
            }
            Column::Funding => set_opt(&mut rec.funding, parse_amount(value)),
            Column::AwardCeiling => set_opt(&mut rec.award_ceiling, parse_amount(value)),
            Column::AwardFloor => set_opt(&mut rec.award_floor, parse_amount(value)),
            Column::PostedDate => set_opt(&mut rec.posted_date, parse_date(value)),
            Column::ResponseDate => set_opt(&mut rec.response_date, parse_date(value)),
            Column::Agency => set_text(&mut rec.agency, value),
            Column::AgencyEmail => set_text(&mut rec.agency_email, value),
            Column::AgencyPhone => set_text(&mut rec.agency_phone, value),
            Column::Client => set_text(&mut rec.client, value),
            Column::Email => set_text(&mut rec.email, value),
            Column::Phone => set_text(&mut rec.phone, value),
            Column::Business => set_text(&mut rec.business, value),
            Column::Industry => set_text(&mut rec.industry, value),
            Column::State => set_text(&mut rec.state, value),
            Column::Country => set_text(&mut rec.country, value),
            Column::Address => set_text(&mut rec.address, value),
        }
    }
    rec
}

fn set_text(field: &mut String, value: &str) {
    if field.is_empty() && !value.is_empty() {
        *field = value.to_string();
    }
}

fn set_opt<T>(field: &mut Option<T>, value: Option<T>) {
    if field.is_none() {
        *field = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn canonical_headers() {
        let csv = "\
Grant Type,Opportunity Number,Status,Eligibility,Funding,Award Ceiling,Award Floor,Posted Date,Response Date,Agency
Pell Grants,GRANT-PEL-2025-001,Interested,Yes,\"$5,000\",7395,1000,2025-01-10,03/15/2025,Department of Education
";
        let table = read_grant_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        let r = &table.records()[0];
        assert_eq!(r.grant_type, "Pell Grants");
        assert_eq!(r.opportunity_number, "GRANT-PEL-2025-001");
        assert_eq!(r.status, GrantStatus::Interested);
        assert_eq!(r.eligibility, Eligibility::Yes);
        assert_eq!(r.funding, Some(5_000));
        assert_eq!(r.award_ceiling, Some(7_395));
        assert_eq!(r.award_floor, Some(1_000));
        assert_eq!(r.posted_date, NaiveDate::from_ymd_opt(2025, 1, 10));
        assert_eq!(r.response_date, NaiveDate::from_ymd_opt(2025, 3, 15));
        assert_eq!(r.agency, "Department of Education");
    }

    #[test]
    fn client_roster_without_scoring_columns() {
        let csv = "\
client,Email,Business,Summary,Nsic code,Industry,phone number,State,Country,Address
Client_1,client1@example.com,Business_1,Summary,NSIC1001,Technology,+1-555-1001,CA,USA,101 Main St
Client_2,client2@example.com,Business_2,Summary,NSIC1002,Energy,+1-555-1002,TX,USA,102 Main St
";
        let table = read_grant_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        let r = &table.records()[1];
        assert_eq!(r.client, "Client_2");
        assert_eq!(r.industry, "Energy");
        assert_eq!(r.phone, "+1-555-1002");
        assert_eq!(r.state, "TX");
        assert_eq!(r.funding, None);
        assert_eq!(r.response_date, None);
        assert_eq!(r.eligibility, Eligibility::No);
    }

    #[test]
    fn malformed_values_degrade_to_defaults() {
        let csv = "\
grant_type,status,funding,response_date,eligibility
Arts & Culture Grants,Pending Review,lots,sometime soon,maybe
";
        let table = read_grant_csv(csv.as_bytes()).unwrap();
        let r = &table.records()[0];
        assert_eq!(r.status, GrantStatus::Other("Pending Review".into()));
        assert_eq!(r.funding, None);
        assert_eq!(r.response_date, None);
        assert_eq!(r.eligibility, Eligibility::No);
    }

    #[test]
    fn ragged_and_blank_rows() {
        let csv = "\
Grant Type,Status,Funding
Pell Grants,New
,,
NSF,Interested,1000000,extra
";
        let table = read_grant_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].funding, None);
        assert_eq!(table.records()[1].funding, Some(1_000_000));
    }

    #[test]
    fn header_only_is_empty_table() {
        let table = read_grant_csv("Grant Type,Status\n".as_bytes()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn duplicate_aliases_keep_first_value() {
        let csv = "Grant Type,Category\n,Pell Grants\nNSF,Other\n";
        let table = read_grant_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.records()[0].grant_type, "Pell Grants");
        assert_eq!(table.records()[1].grant_type, "NSF");
    }

    #[test]
    fn header_folding() {
        assert_eq!(column_for("Response Date"), Some(Column::ResponseDate));
        assert_eq!(column_for("response_date"), Some(Column::ResponseDate));
        assert_eq!(column_for("  CLIENT "), Some(Column::Client));
        assert_eq!(column_for("Summary"), None);
    }
}
