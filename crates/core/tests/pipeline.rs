// ABOUTME: Integration tests for the full batch: HTTP fetch, builtin adapters, detection and store persistence.
// ABOUTME: Uses httpmock to serve product pages and tempfile for the price store.

use std::fs;

use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use pricewatch_core::{
    detect, load_builtin_registry, parse_rows, parse_watchlist, FetcherBuilder, Outcome, Price,
    PriceStore,
};
use tempfile::TempDir;

const AMAZON: &str = include_str!("fixtures/amazon_product.html");
const FLIPKART: &str = include_str!("fixtures/flipkart_product.html");
const FLIPKART_NEW: &str = include_str!("fixtures/flipkart_new_layout.html");

fn html(then: httpmock::Then, body: &str) {
    then.status(200)
        .header("content-type", "text/html; charset=utf-8")
        .body(body);
}

/// Two runs against the same store: the first seeds prices, the second
/// sees one price move and one page disappear.
#[test]
fn two_runs_detect_change_and_age_out_failures() {
    let server = MockServer::start();
    let amazon_url = server.url("/amazon/dp/B0KETTLE");
    let flipkart_url = server.url("/flipkart/earbuds/p/itm1");
    let flipkart_new_url = server.url("/flipkart/watch/p/itm2");
    let unsupported_url = server.url("/unknown-shop/item");

    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("prices.csv");
    let registry = load_builtin_registry();
    let fetcher = FetcherBuilder::new().build().unwrap();
    let urls = vec![
        amazon_url.clone(),
        flipkart_url.clone(),
        flipkart_new_url.clone(),
        unsupported_url.clone(),
    ];

    // Run 1: empty store.
    let mut amazon = server.mock(|when, then| {
        when.method(GET).path("/amazon/dp/B0KETTLE");
        html(then, AMAZON);
    });
    let mut flipkart = server.mock(|when, then| {
        when.method(GET).path("/flipkart/earbuds/p/itm1");
        html(then, FLIPKART);
    });
    let flipkart_new = server.mock(|when, then| {
        when.method(GET).path("/flipkart/watch/p/itm2");
        html(then, FLIPKART_NEW);
    });

    let baseline = PriceStore::load(&store_path).unwrap();
    let report = detect(&urls, &baseline, &registry, &fetcher);
    assert!(report.changes.is_empty());
    assert_eq!(report.store.get(&amazon_url), Some("1234.56".parse().unwrap()));
    assert_eq!(report.store.get(&flipkart_url), Some(Price::from_major(1499)));
    assert_eq!(report.store.get(&flipkart_new_url), Some(Price::from_major(2299)));
    assert_eq!(report.store.len(), 3);
    assert_eq!(report.outcomes[3].outcome, Outcome::Unsupported);
    report.store.save(&store_path).unwrap();

    amazon.assert();
    flipkart.assert();
    flipkart_new.assert();

    // Run 2: Amazon drops in price, the earbuds page is gone.
    amazon.delete();
    flipkart.delete();
    amazon = server.mock(|when, then| {
        when.method(GET).path("/amazon/dp/B0KETTLE");
        html(
            then,
            &AMAZON
                .replace("1,234<span", "1,099<span")
                .replace(">56<", ">00<"),
        );
    });
    flipkart = server.mock(|when, then| {
        when.method(GET).path("/flipkart/earbuds/p/itm1");
        then.status(404).body("not found");
    });

    let baseline = PriceStore::load(&store_path).unwrap();
    let report = detect(&urls, &baseline, &registry, &fetcher);
    amazon.assert();
    flipkart.assert();

    assert_eq!(report.changes.len(), 1);
    let change = &report.changes[0];
    assert_eq!(change.url, amazon_url);
    assert_eq!(change.previous_price, Some("1234.56".parse().unwrap()));
    assert_eq!(change.current_price, Price::from_major(1099));

    assert!(matches!(
        report.outcomes[1].outcome,
        Outcome::FetchFailed { .. }
    ));
    assert_eq!(
        report.outcomes[2].outcome,
        Outcome::Unchanged {
            current: Price::from_major(2299)
        }
    );

    report.store.save(&store_path).unwrap();
    let saved = fs::read_to_string(&store_path).unwrap();
    assert!(!saved.contains("/flipkart/earbuds/"));
    assert!(saved.contains(&format!("{},1099.00\n", amazon_url)));
}

#[test]
fn reference_prices_seed_first_run() {
    let server = MockServer::start();
    let url = server.url("/flipkart/earbuds/p/itm1");
    server.mock(|when, then| {
        when.method(GET).path("/flipkart/earbuds/p/itm1");
        html(then, FLIPKART);
    });

    let sheet = format!("{},\"1,599\"\n", url);
    let entries = parse_watchlist(&parse_rows(&sheet));
    let baseline = PriceStore::from_references(&entries);
    let urls: Vec<&str> = entries.iter().map(|e| e.url.as_str()).collect();

    let fetcher = FetcherBuilder::new().build().unwrap();
    let report = detect(&urls, &baseline, &load_builtin_registry(), &fetcher);

    assert_eq!(report.changes.len(), 1);
    assert_eq!(report.changes[0].previous_price, Some(Price::from_major(1599)));
    assert_eq!(report.changes[0].current_price, Price::from_major(1499));
}
