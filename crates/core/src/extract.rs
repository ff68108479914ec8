// ABOUTME: Price extraction from fetched page content using a site adapter's selectors.
// ABOUTME: Tries primary then fallback selectors, joins a split fractional part, cleans and parses.

//! Price extraction.
//!
//! Key behaviors:
//! - Selectors are tried in order; the first one matching an element with
//!   non-empty text wins.
//! - A fractional-part element, when the adapter names one and the page has
//!   it, is appended to the whole-part text with no separator.
//! - Cleaning removes the adapter's strip fragments and all whitespace.
//! - Anything that does not parse as a price is an Extract error.

use dom_query::Document;

use crate::adapters::compiled::get_or_compile;
use crate::adapters::registry::SiteAdapter;
use crate::error::WatchError;
use crate::fetch::{decode_body, Page};
use crate::price::Price;

/// Extracts a price from raw page bytes, detecting the charset.
pub fn extract(content: &[u8], adapter: &SiteAdapter) -> Result<Price, WatchError> {
    extract_html("", &decode_body(content, None), adapter)
}

/// Extracts a price from a fetched page, honoring its Content-Type charset.
pub fn extract_page(page: &Page, adapter: &SiteAdapter) -> Result<Price, WatchError> {
    extract_html(&page.url, &page.text(), adapter)
}

/// Extracts a price from decoded HTML. `url` is only used for error context.
pub fn extract_html(url: &str, html: &str, adapter: &SiteAdapter) -> Result<Price, WatchError> {
    let doc = Document::from(html);

    let whole = adapter
        .selectors
        .iter()
        .find_map(|css| first_text(&doc, css))
        .ok_or_else(|| {
            WatchError::extract(
                url,
                "Extract",
                Some(anyhow::anyhow!(
                    "no element matched selectors {:?} for {}",
                    adapter.selectors,
                    adapter.id
                )),
            )
        })?;

    let mut text = clean_price_text(&whole, &adapter.strip);
    if let Some(fraction) = adapter.fraction.as_deref().and_then(|css| first_text(&doc, css)) {
        text.push_str(&clean_price_text(&fraction, &adapter.strip));
    }

    text.parse::<Price>().map_err(|e| {
        WatchError::extract(url, "Extract", Some(anyhow::anyhow!(e)))
    })
}

/// Removes the strip fragments and every whitespace character.
pub fn clean_price_text(text: &str, strip: &[String]) -> String {
    let mut cleaned = text.to_string();
    for fragment in strip.iter().filter(|f| !f.is_empty()) {
        cleaned = cleaned.replace(fragment.as_str(), "");
    }
    cleaned.retain(|c| !c.is_whitespace());
    cleaned
}

/// Text of the first element matching `css` whose text is not blank.
fn first_text(doc: &Document, css: &str) -> Option<String> {
    let matcher = get_or_compile(css)?;
    let found = doc
        .select_matcher(&matcher)
        .iter()
        .map(|el| el.text().to_string())
        .find(|text| !text.trim().is_empty());
    if found.is_none() {
        tracing::debug!(selector = css, "selector matched no text");
    }
    found
}
