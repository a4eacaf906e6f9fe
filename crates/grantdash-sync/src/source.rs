//! Load policy: cached sheet fetch, falling back to generated sample data.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use grantdash_core::DashboardConfig;
use grantdash_core::sample;
use grantdash_store::GrantTable;
use tracing::{debug, info, warn};

use crate::IngestionError;
use crate::sheet::{SheetFetcher, SheetRef};

/// Where a loaded table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Sheet,
    Sample,
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub table: GrantTable,
    pub origin: Origin,
    /// Set exactly when `origin` is [`Origin::Sample`].
    pub warning: Option<String>,
}

struct CacheEntry {
    fetched_at: Instant,
    table: GrantTable,
}

pub struct DataSource<F> {
    fetcher: F,
    sheet_name: String,
    ttl: Duration,
    seed: Option<u64>,
    cache: HashMap<String, CacheEntry>,
}

impl<F: SheetFetcher> DataSource<F> {
    pub fn new(fetcher: F, config: &DashboardConfig) -> Self {
        Self {
            fetcher,
            sheet_name: config.sheet_name.clone(),
            ttl: config.cache_ttl,
            seed: config.sample_seed,
            cache: HashMap::new(),
        }
    }

    /// Load the sheet behind `url`, serving from cache while fresh.
    ///
    /// Never fails: any ingestion error is logged once and replaced by
    /// sample data generated for `today`.
    pub async fn load(&mut self, url: &str, today: NaiveDate) -> LoadOutcome {
        self.evict_expired();
        if let Some(entry) = self.cache.get(url) {
            debug!(url, rows = entry.table.len(), "sheet cache hit");
            return LoadOutcome {
                table: entry.table.clone(),
                origin: Origin::Sheet,
                warning: None,
            };
        }
        self.fetch_or_fallback(url, today).await
    }

    /// Like [`load`](Self::load) but always goes to the network.
    pub async fn refresh(&mut self, url: &str, today: NaiveDate) -> LoadOutcome {
        self.cache.remove(url);
        self.fetch_or_fallback(url, today).await
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Number of cached sheets, fresh or not.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn evict_expired(&mut self) {
        let ttl = self.ttl;
        self.cache.retain(|_, entry| entry.fetched_at.elapsed() < ttl);
    }

    async fn fetch_or_fallback(&mut self, url: &str, today: NaiveDate) -> LoadOutcome {
        match self.fetch(url).await {
            Ok(table) => {
                info!(url, rows = table.len(), "loaded sheet");
                self.cache.insert(
                    url.to_string(),
                    CacheEntry {
                        fetched_at: Instant::now(),
                        table: table.clone(),
                    },
                );
                LoadOutcome {
                    table,
                    origin: Origin::Sheet,
                    warning: None,
                }
            }
            Err(err) => {
                warn!(url, error = %err, "sheet load failed, using sample data");
                let table = GrantTable::new(sample::generate(self.seed, today));
                LoadOutcome {
                    table,
                    origin: Origin::Sample,
                    warning: Some(format!(
                        "Could not load data from Google Sheets ({err}). Showing sample data."
                    )),
                }
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<GrantTable, IngestionError> {
        let export = SheetRef::parse(url)?.csv_export_url(&self.sheet_name);
        self.fetcher.fetch(&export).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use grantdash_core::sample::SAMPLE_ROWS;
    use grantdash_store::DashboardMetrics;

    use crate::sheet::parse_csv_body;

    const URL: &str = "https://docs.google.com/spreadsheets/d/abc123/edit?usp=sharing";

    /// Serves a fixed body (or error) and counts calls.
    struct MockFetcher {
        body: Option<&'static [u8]>,
        calls: Arc<AtomicUsize>,
        last_url: std::sync::Mutex<String>,
    }

    impl MockFetcher {
        fn new(body: Option<&'static [u8]>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let fetcher = Self {
                body,
                calls: calls.clone(),
                last_url: std::sync::Mutex::new(String::new()),
            };
            (fetcher, calls)
        }
    }

    #[async_trait]
    impl SheetFetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<GrantTable, IngestionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_url.lock().unwrap() = url.to_string();
            match self.body {
                Some(body) => parse_csv_body(body),
                None => Err(IngestionError::Server {
                    status: 503,
                    body: "unavailable".into(),
                }),
            }
        }
    }

    const BODY: &[u8] =
        b"Grant Type,Status,Funding\nPell Grants,New,5000\nNSF,Interested,900000\n";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    fn config(ttl: Duration) -> DashboardConfig {
        DashboardConfig {
            cache_ttl: ttl,
            sample_seed: Some(42),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn loads_sheet_through_export_url() {
        let (fetcher, calls) = MockFetcher::new(Some(BODY));
        let mut source = DataSource::new(fetcher, &config(Duration::from_secs(300)));
        let out = source.load(URL, today()).await;
        assert_eq!(out.origin, Origin::Sheet);
        assert!(out.warning.is_none());
        assert_eq!(out.table.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *source.fetcher.last_url.lock().unwrap(),
            "https://docs.google.com/spreadsheets/d/abc123/gviz/tq?tqx=out:csv&sheet=Sheet1"
        );
    }

    #[tokio::test]
    async fn invalid_url_falls_back_without_fetching() {
        let (fetcher, calls) = MockFetcher::new(Some(BODY));
        let mut source = DataSource::new(fetcher, &config(Duration::from_secs(300)));
        let out = source.load("https://example.com/not-a-sheet", today()).await;
        assert_eq!(out.origin, Origin::Sample);
        assert_eq!(out.table.len(), SAMPLE_ROWS);
        assert!(out.warning.as_deref().unwrap().contains("sample data"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn server_error_falls_back_and_is_not_cached() {
        let (fetcher, calls) = MockFetcher::new(None);
        let mut source = DataSource::new(fetcher, &config(Duration::from_secs(300)));
        let first = source.load(URL, today()).await;
        let second = source.load(URL, today()).await;
        assert_eq!(first.origin, Origin::Sample);
        assert!(first.warning.as_deref().unwrap().contains("503"));
        assert_eq!(second.origin, Origin::Sample);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // Same seed, same day: identical sample tables.
        assert_eq!(first.table, second.table);
    }

    #[tokio::test]
    async fn empty_sheet_falls_back() {
        let (fetcher, _) = MockFetcher::new(Some(&b"Grant Type,Status\n"[..]));
        let mut source = DataSource::new(fetcher, &config(Duration::from_secs(300)));
        let out = source.load(URL, today()).await;
        assert_eq!(out.origin, Origin::Sample);
        assert_eq!(out.table.len(), SAMPLE_ROWS);
    }

    #[tokio::test]
    async fn cache_serves_until_cleared_or_refreshed() {
        let (fetcher, calls) = MockFetcher::new(Some(BODY));
        let mut source = DataSource::new(fetcher, &config(Duration::from_secs(300)));
        source.load(URL, today()).await;
        source.load(URL, today()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        source.refresh(URL, today()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        source.clear_cache();
        source.load(URL, today()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_ttl_disables_cache() {
        let (fetcher, calls) = MockFetcher::new(Some(BODY));
        let mut source = DataSource::new(fetcher, &config(Duration::ZERO));
        source.load(URL, today()).await;
        source.load(URL, today()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_fetch_still_yields_a_full_dashboard() {
        let (fetcher, _) = MockFetcher::new(None);
        let mut source = DataSource::new(fetcher, &config(Duration::from_secs(300)));
        let out = source.load(URL, today()).await;

        assert_eq!(out.origin, Origin::Sample);
        let warning = out.warning.unwrap();
        assert!(warning.starts_with("Could not load data from Google Sheets ("));
        assert!(warning.ends_with("Showing sample data."));

        let m = DashboardMetrics::compute(&out.table.scored(today()));
        assert_eq!(m.total_records, SAMPLE_ROWS);
        assert!(m.total_funding > 0);
        assert!(m.grant_types > 0);
        assert!(m.average_score.is_some_and(|s| s > 0.0));
    }

    #[tokio::test]
    async fn non_utf8_sheet_falls_back() {
        let (fetcher, calls) = MockFetcher::new(Some(&b"Grant Type,Status\nPell\xff,New\n"[..]));
        assert!(matches!(fetcher.fetch(URL).await, Err(IngestionError::Csv(_))));
        let mut source = DataSource::new(fetcher, &config(Duration::from_secs(300)));
        let out = source.load(URL, today()).await;
        assert_eq!(out.origin, Origin::Sample);
        assert_eq!(out.table.len(), SAMPLE_ROWS);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.cached(), 0);
    }

    #[tokio::test]
    async fn expired_entries_are_evicted() {
        const OTHER: &str = "https://docs.google.com/spreadsheets/d/other/edit";
        let (fetcher, _) = MockFetcher::new(Some(BODY));
        let mut source = DataSource::new(fetcher, &config(Duration::ZERO));
        source.load(URL, today()).await;
        assert_eq!(source.cached(), 1);
        source.load(OTHER, today()).await;
        assert_eq!(source.cached(), 1);
        source.clear_cache();
        assert_eq!(source.cached(), 0);
    }
}
