//! Core grant types: records, the grant-type catalog, scoring, date parsing,
//! sample data and the Arrow schema for scored rows.

pub mod catalog;
pub mod config;
pub mod dates;
pub mod record;
pub mod sample;
pub mod schema;
pub mod scoring;

pub use catalog::{GrantCatalogEntry, GrantCategory};
pub use config::DashboardConfig;
pub use dates::parse_date;
pub use record::{Eligibility, GrantRecord, GrantStatus};
pub use schema::grants;
pub use scoring::{
    DeadlineStatus, ScoredGrantRecord, Urgency, calculate_grant_score, classify_deadline, progress,
};
