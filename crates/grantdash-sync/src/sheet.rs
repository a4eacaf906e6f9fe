//! Spreadsheet addressing and the fetch seam.

use async_trait::async_trait;
use grantdash_store::{GrantTable, read_grant_csv};
use tracing::debug;

use crate::IngestionError;

const SHEETS_PREFIX: &str = "docs.google.com/spreadsheets/d/";

/// A validated Google Sheets document reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRef {
    id: String,
}

impl SheetRef {
    /// Accepts `http(s)://docs.google.com/spreadsheets/d/<ID>[/...]` and
    /// nothing else. The ID must be non-empty `[A-Za-z0-9_-]`.
    pub fn parse(url: &str) -> Result<Self, IngestionError> {
        let invalid = || IngestionError::InvalidUrl(url.to_string());
        let trimmed = url.trim();
        let rest = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .ok_or_else(invalid)?;
        let rest = rest.strip_prefix(SHEETS_PREFIX).ok_or_else(invalid)?;
        let id = rest
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default();
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid());
        }
        Ok(Self { id: id.to_string() })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The gviz CSV export endpoint for one worksheet.
    pub fn csv_export_url(&self, sheet_name: &str) -> String {
        format!(
            "https://{SHEETS_PREFIX}{}/gviz/tq?tqx=out:csv&sheet={}",
            self.id,
            encode_query_value(sheet_name)
        )
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Turn a downloaded CSV body into a table. A body with no data rows is an
/// error so that the caller can fall back; so is one that is not UTF-8.
pub fn parse_csv_body(body: &[u8]) -> Result<GrantTable, IngestionError> {
    let table = read_grant_csv(body)?;
    if table.is_empty() {
        return Err(IngestionError::Empty);
    }
    debug!(rows = table.len(), "parsed sheet body");
    Ok(table)
}

/// Something that can download a CSV export URL into a table.
#[async_trait]
pub trait SheetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<GrantTable, IngestionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "1xok6PwIk5Kyj78KhBFkjJYGNSdkosxeXliTy0Alt3bc";

    #[test]
    fn parses_share_url() {
        let url = format!("https://docs.google.com/spreadsheets/d/{ID}/edit?usp=sharing");
        let sheet = SheetRef::parse(&url).unwrap();
        assert_eq!(sheet.id(), ID);

        let bare = SheetRef::parse(&format!("http://docs.google.com/spreadsheets/d/{ID}")).unwrap();
        assert_eq!(bare.id(), ID);
    }

    #[test]
    fn rejects_other_urls() {
        for url in [
            "",
            "not a url",
            "https://example.com/spreadsheets/d/abc",
            "https://docs.google.com/spreadsheets/d/",
            "https://docs.google.com/spreadsheets/d//edit",
            "https://docs.google.com/spreadsheets/d/abc$def/edit",
            "ftp://docs.google.com/spreadsheets/d/abc",
        ] {
            assert!(
                matches!(SheetRef::parse(url), Err(IngestionError::InvalidUrl(_))),
                "{url}"
            );
        }
    }

    #[test]
    fn export_url_encodes_sheet_name() {
        let sheet =
            SheetRef::parse("https://docs.google.com/spreadsheets/d/abc_123-X/edit").unwrap();
        assert_eq!(
            sheet.csv_export_url("Sheet1"),
            "https://docs.google.com/spreadsheets/d/abc_123-X/gviz/tq?tqx=out:csv&sheet=Sheet1"
        );
        assert!(sheet.csv_export_url("Q1 & Q2").ends_with("&sheet=Q1%20%26%20Q2"));
    }

    #[test]
    fn empty_body_is_an_error() {
        assert!(matches!(
            parse_csv_body(b"Grant Type,Status\n"),
            Err(IngestionError::Empty)
        ));
        assert!(matches!(parse_csv_body(b""), Err(IngestionError::Empty)));
        assert_eq!(parse_csv_body(b"Grant Type\nPell Grants\n").unwrap().len(), 1);
    }

    #[test]
    fn non_utf8_body_is_a_csv_error() {
        let body = b"Grant Type,Status\nPell \xff\xfe Grants,New\n";
        assert!(matches!(parse_csv_body(body), Err(IngestionError::Csv(_))));
    }
}
