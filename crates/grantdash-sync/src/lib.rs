//! Ingestion layer: spreadsheet CSV export over HTTP, with a TTL cache and a
//! sample-data fallback.

mod error;
pub use error::IngestionError;

pub mod sheet;
pub mod source;

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::SheetClient;

pub use sheet::{SheetFetcher, SheetRef, parse_csv_body};
pub use source::{DataSource, LoadOutcome, Origin};
