// ABOUTME: Batch entry point: loads the watchlist and store, detects price changes, saves, notifies.
// ABOUTME: All configuration comes from flags or PRICEWATCH_* environment variables.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use pricewatch_core::{
    detect, load_builtin_registry, load_location, load_registry_file, notify_all, parse_rows,
    parse_subscribers, parse_watchlist, sheet_export_url, FetcherBuilder, HttpFetcher, Notifier,
    Outcome, OutboxNotifier, PriceStore, RunReport, WriterNotifier,
};
use tracing_subscriber::EnvFilter;

/// Check product pages for price changes and notify subscribers.
#[derive(Parser, Debug)]
#[command(name = "pricewatch")]
#[command(about = "Detect product price changes and notify subscribers", long_about = None)]
struct Args {
    /// Watchlist location: http(s) URL, file path, or "-" for stdin.
    #[arg(long, env = "PRICEWATCH_URLS")]
    urls: Option<String>,

    /// Subscriber list location: http(s) URL, file path, or "-" for stdin.
    #[arg(long, env = "PRICEWATCH_SUBSCRIBERS")]
    subscribers: Option<String>,

    /// Google Sheets document id used with --urls-gid / --subscribers-gid.
    #[arg(long, env = "PRICEWATCH_SHEET_ID")]
    sheet_id: Option<String>,

    /// Sheet tab (gid) holding the watchlist.
    #[arg(long, env = "PRICEWATCH_URLS_GID", requires = "sheet_id")]
    urls_gid: Option<String>,

    /// Sheet tab (gid) holding subscriber addresses.
    #[arg(long, env = "PRICEWATCH_SUBSCRIBERS_GID", requires = "sheet_id")]
    subscribers_gid: Option<String>,

    /// Price store file.
    #[arg(long, env = "PRICEWATCH_STORE", default_value = "prices.csv")]
    store: PathBuf,

    /// Directory to drop notification messages into (default: stdout).
    #[arg(long, env = "PRICEWATCH_OUTBOX")]
    outbox: Option<PathBuf>,

    /// JSON file with extra or replacement site adapters.
    #[arg(long, env = "PRICEWATCH_ADAPTERS")]
    adapters: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Override the browser User-Agent.
    #[arg(long)]
    user_agent: Option<String>,

    /// Print the run report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Check prices without writing the store or sending notifications.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Debug logging (overridden by RUST_LOG).
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<ExitCode> {
    let urls_location = match (&args.urls, &args.sheet_id, &args.urls_gid) {
        (Some(loc), _, None) => loc.clone(),
        (None, Some(id), Some(gid)) => sheet_export_url(id, gid),
        (Some(_), _, Some(_)) => bail!("use either --urls or --urls-gid, not both"),
        _ => bail!("a watchlist is required: pass --urls or --sheet-id with --urls-gid"),
    };
    let subscribers_location = match (&args.subscribers, &args.sheet_id, &args.subscribers_gid) {
        (Some(_), _, Some(_)) => bail!("use either --subscribers or --subscribers-gid, not both"),
        (Some(loc), _, None) => Some(loc.clone()),
        (None, Some(id), Some(gid)) => Some(sheet_export_url(id, gid)),
        _ => None,
    };

    let mut builder = FetcherBuilder::new().timeout(Duration::from_secs(args.timeout.max(1)));
    if let Some(ua) = &args.user_agent {
        builder = builder.user_agent(ua.clone());
    }
    let fetcher = builder.build().context("building HTTP client")?;

    let registry = match &args.adapters {
        Some(path) => load_registry_file(path)?,
        None => load_builtin_registry(),
    };

    let watchlist = parse_watchlist(&parse_rows(&load_location(&urls_location, &fetcher)?));
    tracing::info!(entries = watchlist.len(), "loaded watchlist");

    let baseline = match PriceStore::load_existing(&args.store)? {
        Some(store) => store,
        None => {
            let seeded = PriceStore::from_references(&watchlist);
            if !seeded.is_empty() {
                tracing::info!(entries = seeded.len(), "seeded baseline from watchlist reference prices");
            }
            seeded
        }
    };

    let urls: Vec<&str> = watchlist.iter().map(|e| e.url.as_str()).collect();
    let report = detect(&urls, &baseline, &registry, &fetcher);

    let mut failed = false;
    if args.dry_run {
        tracing::info!("dry run: store not written, notifications not sent");
    } else {
        report.store.save(&args.store)?;
        if let Some(location) = &subscribers_location {
            let target = match &args.outbox {
                Some(dir) => Delivery::Outbox(dir.as_path()),
                // Keep stdout parseable when it carries the JSON report.
                None if args.json => Delivery::Stderr,
                None => Delivery::Stdout,
            };
            failed |= !notify_subscribers(location, &fetcher, target, &report);
        } else if !report.changes.is_empty() {
            tracing::warn!("price changes found but no subscriber list configured");
        }
    }

    print_report(&report, args.json)?;

    Ok(if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

/// Channel for subscriber notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery<'a> {
    Stdout,
    Stderr,
    Outbox(&'a Path),
}

/// Returns false if any subscriber could not be notified.
fn notify_subscribers(
    location: &str,
    fetcher: &HttpFetcher,
    target: Delivery<'_>,
    report: &RunReport,
) -> bool {
    if report.changes.is_empty() {
        return true;
    }
    let subscribers = match load_location(location, fetcher) {
        Ok(text) => parse_subscribers(&parse_rows(&text)),
        Err(e) => {
            tracing::error!(error = %e, "could not load subscribers");
            return false;
        }
    };
    if subscribers.is_empty() {
        tracing::warn!("subscriber list is empty");
        return true;
    }

    let mut notifier: Box<dyn Notifier> = match target {
        Delivery::Outbox(dir) => Box::new(OutboxNotifier::new(dir)),
        Delivery::Stderr => Box::new(WriterNotifier::new(io::stderr())),
        Delivery::Stdout => Box::new(WriterNotifier::new(io::stdout())),
    };
    let summary = notify_all(notifier.as_mut(), &subscribers, &report.changes);
    tracing::info!(sent = summary.sent, failed = summary.failed.len(), "notifications done");
    summary.failed.is_empty()
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(report)?)?;
        return Ok(());
    }

    let priced = report.count(|o| o.current_price().is_some());
    let unsupported = report.count(|o| matches!(o, Outcome::Unsupported));
    let failed = report.count(Outcome::is_failure);
    writeln!(
        out,
        "checked {} urls: {} priced, {} changed, {} failed, {} unsupported",
        report.outcomes.len(),
        priced,
        report.changes.len(),
        failed,
        unsupported
    )?;
    for change in &report.changes {
        let previous = change
            .previous_price
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(out, "{}: {} -> {}", change.url, previous, change.current_price)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_require_watchlist_source() {
        let args = Args::parse_from(["pricewatch", "--store", "/tmp/none.csv"]);
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("a watchlist is required"));
    }

    #[test]
    fn gid_requires_sheet_id() {
        let res = Args::try_parse_from(["pricewatch", "--urls-gid", "0"]);
        assert!(res.is_err());
    }
}
