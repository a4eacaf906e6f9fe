use grantdash_store::StoreError;
use thiserror::Error;

/// Why a spreadsheet load failed. Every variant is recoverable by falling
/// back to sample data.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("not a Google Sheets URL: {0}")]
    InvalidUrl(String),

    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("csv error: {0}")]
    Csv(#[from] StoreError),

    #[error("sheet has no data rows")]
    Empty,
}
