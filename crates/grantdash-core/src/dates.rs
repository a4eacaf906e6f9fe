//! Lenient date parsing for spreadsheet cells.
//!
//! All dates are naive calendar dates compared against the local clock. There
//! is no time zone handling; a deadline is "today" in whatever zone the
//! process runs in.

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Formats tried in order; the first one that parses wins.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Placeholder strings spreadsheet exports use for an empty cell.
const EMPTY_MARKERS: &[&str] = &["nan", "nat", "null", "none", "n/a"];

/// Parse a raw cell into a date.
///
/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD`, `MM/DD/YYYY` and `DD/MM/YYYY`.
/// Ambiguous slash dates such as `03/04/2024` resolve as month-first.
/// Anything else, including empty cells, is `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() || EMPTY_MARKERS.iter().any(|m| s.eq_ignore_ascii_case(m)) {
        return None;
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, DATETIME_FORMAT) {
        return Some(dt.date());
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Whole days from `today` until `date`; negative once the date has passed.
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// The naive local date used as "now" by the CLI.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// ISO `YYYY-MM-DD`, or an empty string for a missing date.
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
