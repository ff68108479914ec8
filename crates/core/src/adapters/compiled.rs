// ABOUTME: Process-wide cache of compiled CSS selectors, filled when adapters are registered.
// ABOUTME: Selectors that fail to parse are remembered as misses and never match.

use std::collections::HashMap;
use std::sync::RwLock;

use dom_query::Matcher;
use once_cell::sync::Lazy;

type SelectorMap = HashMap<String, Option<Matcher>>;

static SELECTORS: Lazy<RwLock<SelectorMap>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Compiles `css` into `map` unless it is already there.
fn compile_into<'m>(map: &'m mut SelectorMap, css: &str) -> &'m Option<Matcher> {
    map.entry(css.to_string()).or_insert_with(|| {
        let matcher = Matcher::new(css).ok();
        if matcher.is_none() {
            tracing::debug!(selector = css, "selector does not parse");
        }
        matcher
    })
}

/// Matcher for a price selector, or `None` if it does not parse.
///
/// Registered adapters are precompiled, so this is normally a read-locked
/// lookup; unseen selectors are compiled on first use.
pub fn get_or_compile(css: &str) -> Option<Matcher> {
    if let Some(hit) = SELECTORS
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(css)
    {
        return hit.clone();
    }
    let mut map = SELECTORS.write().unwrap_or_else(|e| e.into_inner());
    compile_into(&mut map, css).clone()
}

/// Compiles an adapter's selectors under one write lock and returns the
/// ones that do not parse.
pub fn precompile_selectors<I, S>(selectors: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut map = SELECTORS.write().unwrap_or_else(|e| e.into_inner());
    selectors
        .into_iter()
        .filter(|css| compile_into(&mut map, css.as_ref()).is_none())
        .map(|css| css.as_ref().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_selector_compiles_once() {
        assert!(get_or_compile("span.a-price-whole").is_some());
        assert!(get_or_compile("span.a-price-whole").is_some());
    }

    #[test]
    fn broken_selector_stays_a_miss() {
        assert!(get_or_compile("[[[invalid").is_none());
        assert!(get_or_compile("[[[invalid").is_none());
    }

    #[test]
    fn precompile_reports_only_broken_selectors() {
        let invalid = precompile_selectors(["div._30jeq3", "div.Nx9bqj", "<<<"]);
        assert_eq!(invalid, vec!["<<<".to_string()]);
        assert!(get_or_compile("div.Nx9bqj").is_some());
    }
}
