// ABOUTME: Library entry point for the pricewatch core pipeline.
// ABOUTME: Re-exports adapters, extraction, store, detection, sources and notification APIs.

//! pricewatch - product price change detection.
//!
//! Given a watchlist of product URLs, each URL is matched to a site adapter,
//! fetched, and its price extracted and compared with the last persisted
//! price. The run produces a list of changes and a rebuilt price store.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use pricewatch_core::{detect, load_builtin_registry, FetcherBuilder, PriceStore, WatchError};
//!
//! fn main() -> Result<(), WatchError> {
//!     let fetcher = FetcherBuilder::new().build()?;
//!     let registry = load_builtin_registry();
//!     let path = Path::new("prices.csv");
//!     let baseline = PriceStore::load(path)?;
//!     let report = detect(&["https://www.amazon.in/dp/B0C1"], &baseline, &registry, &fetcher);
//!     for change in &report.changes {
//!         println!("{} -> {}", change.url, change.current_price);
//!     }
//!     report.store.save(path)
//! }
//! ```

pub mod adapters;
pub mod detect;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod notify;
pub mod options;
pub mod price;
pub mod sources;
pub mod store;

pub use crate::adapters::loader::{load_builtin_registry, load_registry_file};
pub use crate::adapters::registry::{AdapterRegistry, SiteAdapter};
pub use crate::detect::{classify, detect, ChangeRecord, Outcome, RunReport, UrlOutcome};
pub use crate::error::{ErrorCode, WatchError};
pub use crate::extract::{extract, extract_page};
pub use crate::fetch::{HttpFetcher, Page, PageFetcher};
pub use crate::notify::{
    notify_all, render_message, Message, Notifier, NotifySummary, OutboxNotifier, WriterNotifier,
};
pub use crate::options::{FetcherBuilder, Options};
pub use crate::price::Price;
pub use crate::sources::{
    load_location, parse_rows, parse_subscribers, parse_watchlist, sheet_export_url, WatchEntry,
};
pub use crate::store::PriceStore;
