//! Storage layer: the in-memory grant table plus everything that reads it.

mod error;
pub use error::StoreError;

pub mod export;
pub mod ingest;
pub mod metrics;
pub mod report;
pub mod session;
pub mod table;
pub mod tracker;
pub mod view;

pub use export::ExportFormat;
pub use ingest::read_grant_csv;
pub use metrics::DashboardMetrics;
pub use report::{QuickReport, Report, ReportSource};
pub use session::Session;
pub use table::GrantTable;
pub use tracker::{Application, ApplicationStatus, ApplicationTracker};
pub use view::{FundingBand, Page, SortKey, ViewFilter};
