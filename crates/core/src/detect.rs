// ABOUTME: Change detection batch: resolve adapter, fetch, extract, compare with baseline, rebuild store.
// ABOUTME: Per-URL failures are classified and skipped; the batch always completes.

//! Change detection.
//!
//! [`detect`] is the fallible fetch/extract layer; [`classify`] is the pure
//! comparison it feeds. The returned store holds only URLs priced in this
//! run, so URLs that fail repeatedly age out of the baseline.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::adapters::registry::AdapterRegistry;
use crate::error::WatchError;
use crate::extract::extract_page;
use crate::fetch::PageFetcher;
use crate::price::Price;
use crate::store::PriceStore;

/// A detected price movement for one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub url: String,
    pub previous_price: Option<Price>,
    pub current_price: Price,
}

/// What happened to one URL during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Priced for the first time.
    New { current: Price },
    Unchanged { current: Price },
    Changed { previous: Price, current: Price },
    /// No adapter matches the URL.
    Unsupported,
    FetchFailed { reason: String },
    ExtractionFailed { reason: String },
}

impl Outcome {
    /// Price extracted in this run, if any.
    pub fn current_price(&self) -> Option<Price> {
        match self {
            Outcome::New { current }
            | Outcome::Unchanged { current }
            | Outcome::Changed { current, .. } => Some(*current),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Outcome::FetchFailed { .. } | Outcome::ExtractionFailed { .. }
        )
    }
}

/// Outcome for one input URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlOutcome {
    pub url: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Everything a batch run produces.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub checked_at: DateTime<Utc>,
    /// One entry per input URL, in input order.
    pub outcomes: Vec<UrlOutcome>,
    /// Changes in input order; empty means nothing to notify.
    pub changes: Vec<ChangeRecord>,
    /// Rebuilt store to persist.
    pub store: PriceStore,
}

impl RunReport {
    /// Number of outcomes matching a predicate.
    pub fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }
}

/// Compares a freshly extracted price with the baseline. Exact equality.
pub fn classify(previous: Option<Price>, current: Price) -> Outcome {
    match previous {
        None => Outcome::New { current },
        Some(previous) if previous == current => Outcome::Unchanged { current },
        Some(previous) => Outcome::Changed { previous, current },
    }
}

/// Runs one batch over `urls`, in order.
pub fn detect<S: AsRef<str>>(
    urls: &[S],
    baseline: &PriceStore,
    registry: &AdapterRegistry,
    fetcher: &dyn PageFetcher,
) -> RunReport {
    let mut store = PriceStore::new();
    let mut changes = Vec::new();
    let mut outcomes = Vec::with_capacity(urls.len());

    for url in urls {
        let url = url.as_ref();
        let outcome = match price_url(url, registry, fetcher) {
            Ok(current) => {
                let outcome = classify(baseline.get(url), current);
                store.insert(url, current);
                if let Outcome::Changed { previous, current } = outcome {
                    tracing::info!(url, %previous, %current, "price changed");
                    changes.push(ChangeRecord {
                        url: url.to_string(),
                        previous_price: Some(previous),
                        current_price: current,
                    });
                } else {
                    tracing::info!(url, %current, status = outcome_label(&outcome), "price checked");
                }
                outcome
            }
            Err(failure) => failure,
        };
        outcomes.push(UrlOutcome {
            url: url.to_string(),
            outcome,
        });
    }

    RunReport {
        checked_at: Utc::now(),
        outcomes,
        changes,
        store,
    }
}

/// Resolve, fetch and extract one URL; failures come back as their outcome.
fn price_url(
    url: &str,
    registry: &AdapterRegistry,
    fetcher: &dyn PageFetcher,
) -> Result<Price, Outcome> {
    let Some(adapter) = registry.resolve(url) else {
        tracing::warn!(url, "skipping unsupported site");
        return Err(Outcome::Unsupported);
    };

    let page = fetcher.fetch(url).map_err(|e| {
        tracing::warn!(url, adapter = %adapter.id, error = %e, "fetch failed");
        Outcome::FetchFailed { reason: e.reason() }
    })?;

    extract_page(&page, adapter).map_err(|e: WatchError| {
        tracing::warn!(url, adapter = %adapter.id, error = %e, "price extraction failed");
        Outcome::ExtractionFailed { reason: e.reason() }
    })
}

fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::New { .. } => "new",
        Outcome::Unchanged { .. } => "unchanged",
        Outcome::Changed { .. } => "changed",
        Outcome::Unsupported => "unsupported",
        Outcome::FetchFailed { .. } => "fetch_failed",
        Outcome::ExtractionFailed { .. } => "extraction_failed",
    }
}
