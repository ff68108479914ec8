// ABOUTME: Watchlist and subscriber list sources: spreadsheet CSV exports, URLs, files or stdin.
// ABOUTME: Parses quoted CSV rows into watch entries (URL + optional reference price) and addresses.

use std::fs;
use std::io::{self, Read};
use std::mem::take;

use crate::error::WatchError;
use crate::fetch::{decode_body, PageFetcher};
use crate::price::Price;

/// One monitored product from the watchlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEntry {
    pub url: String,
    /// Price from the optional second column, used as the baseline when no
    /// store file exists yet.
    pub reference_price: Option<Price>,
}

/// CSV export URL for one tab of a Google Sheets document.
pub fn sheet_export_url(sheet_id: &str, gid: &str) -> String {
    format!(
        "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid={}",
        sheet_id, gid
    )
}

/// Reads a source: an http(s) URL (fetched), `-` (stdin) or a local path.
pub fn load_location(location: &str, fetcher: &dyn PageFetcher) -> Result<String, WatchError> {
    if location == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .map_err(|e| WatchError::source_list("-", "Load", Some(anyhow::anyhow!(e))))?;
        return Ok(decode_body(&buf, None));
    }

    if location.starts_with("http://") || location.starts_with("https://") {
        let page = fetcher
            .fetch(location)
            .map_err(|e| WatchError::source_list(location, "Load", Some(anyhow::Error::new(e))))?;
        tracing::info!(url = location, bytes = page.body.len(), "fetched source list");
        return Ok(page.text());
    }

    let bytes = fs::read(location)
        .map_err(|e| WatchError::source_list(location, "Load", Some(anyhow::anyhow!(e))))?;
    Ok(decode_body(&bytes, None))
}

/// Minimal CSV parser: quoted fields, doubled-quote escapes, CRLF endings.
/// Blank lines are dropped.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(take(&mut field));
                push_row(&mut rows, take(&mut row));
            }
            _ => field.push(ch),
        }
    }

    // Unterminated quotes still flush the trailing field.
    row.push(field);
    push_row(&mut rows, row);
    rows
}

fn push_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    if row.iter().any(|cell| !cell.trim().is_empty()) {
        rows.push(row);
    }
}

/// Turns watchlist rows into entries, in input order.
///
/// Rows with a blank first cell are skipped, as is a leading header row
/// whose first cell is `url`. An unparsable reference price is dropped
/// (the URL is still watched).
pub fn parse_watchlist(rows: &[Vec<String>]) -> Vec<WatchEntry> {
    let mut entries = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let url = row.first().map(|c| c.trim()).unwrap_or_default();
        if url.is_empty() || (i == 0 && url.eq_ignore_ascii_case("url")) {
            continue;
        }
        let reference_price = row.get(1).map(|c| c.trim()).filter(|c| !c.is_empty()).and_then(|c| {
            let cleaned = crate::extract::clean_price_text(c, &default_strip());
            match cleaned.parse::<Price>() {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!(url, cell = c, error = %e, "ignoring unparsable reference price");
                    None
                }
            }
        });
        entries.push(WatchEntry {
            url: url.to_string(),
            reference_price,
        });
    }
    entries
}

fn default_strip() -> Vec<String> {
    crate::adapters::registry::DEFAULT_STRIP
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Collects subscriber addresses from either a single comma-separated cell
/// or one address per row. Entries without `@` are dropped; duplicates keep
/// their first position.
pub fn parse_subscribers(rows: &[Vec<String>]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for address in rows.iter().flatten().flat_map(|cell| cell.split(',')) {
        let address = address.trim();
        if !address.contains('@') {
            continue;
        }
        if !out.iter().any(|a| a.eq_ignore_ascii_case(address)) {
            out.push(address.to_string());
        }
    }
    out
}
