use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no record with opportunity number {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}
