//! reqwest transport for the sheet CSV export.

use std::time::Duration;

use async_trait::async_trait;
use grantdash_store::GrantTable;
use tracing::info;

use crate::IngestionError;
use crate::sheet::{SheetFetcher, parse_csv_body};

/// HTTP client for spreadsheet CSV exports. One GET per fetch, no retries.
pub struct SheetClient {
    client: reqwest::Client,
}

impl SheetClient {
    pub fn new(timeout: Duration) -> Result<Self, IngestionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SheetFetcher for SheetClient {
    async fn fetch(&self, url: &str) -> Result<GrantTable, IngestionError> {
        info!(url = %url, "fetching sheet export");
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IngestionError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.bytes().await?;
        let table = parse_csv_body(&body)?;
        info!(rows = table.len(), "fetched sheet export");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_host_is_an_http_error() {
        let client = SheetClient::new(Duration::from_millis(500)).unwrap();
        let err = client
            .fetch("http://127.0.0.1:9/spreadsheets/d/x/gviz/tq?tqx=out:csv")
            .await
            .unwrap_err();
        assert!(matches!(err, IngestionError::Http(_)));
    }
}
