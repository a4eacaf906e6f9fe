//! Shared configuration defaults.

use std::time::Duration;

/// Public sheet the dashboard reads by default.
pub const DEFAULT_SOURCE_URL: &str =
    "https://docs.google.com/spreadsheets/d/1xok6PwIk5Kyj78KhBFkjJYGNSdkosxeXliTy0Alt3bc/edit?usp=sharing";

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// How long a successful sheet load is reused.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub source_url: String,
    pub sheet_name: String,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    /// Seed for fallback sample data; `None` draws a fresh dataset each time.
    pub sample_seed: Option<u64>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            sample_seed: None,
        }
    }
}
