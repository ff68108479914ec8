// ABOUTME: Persisted URL -> last-known price mapping stored as "<url>,<price>" lines.
// ABOUTME: Loading is permissive (bad rows skipped, missing file = empty); saving rewrites the file whole.

use std::collections::btree_map::{self, BTreeMap};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::WatchError;
use crate::price::Price;
use crate::sources::WatchEntry;

/// URL -> price baseline, ordered by URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PriceStore {
    prices: BTreeMap<String, Price>,
}

impl PriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a store file; a missing file yields an empty store.
    ///
    /// Rows without exactly two columns, with an empty URL or with an
    /// unparsable price are skipped.
    pub fn load(path: &Path) -> Result<Self, WatchError> {
        Ok(Self::load_existing(path)?.unwrap_or_default())
    }

    /// Like [`PriceStore::load`], but `None` when there is no file yet, so a
    /// caller can tell a first run from an empty store.
    pub fn load_existing(path: &Path) -> Result<Option<Self>, WatchError> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(Self::parse(&text))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no price store yet");
                Ok(None)
            }
            Err(e) => Err(WatchError::store(
                path.display().to_string(),
                "Load",
                Some(anyhow::anyhow!(e)),
            )),
        }
    }

    /// Parses store file contents.
    pub fn parse(text: &str) -> Self {
        let mut store = Self::new();
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_record(line) {
                Some((url, price)) => {
                    store.insert(url, price);
                }
                None => tracing::debug!(line = lineno + 1, row = line, "skipping malformed store row"),
            }
        }
        store
    }

    /// Writes every entry to `path`, replacing its contents.
    ///
    /// The data goes to a sibling temporary file first and is renamed over
    /// the target once complete.
    pub fn save(&self, path: &Path) -> Result<(), WatchError> {
        let store_err =
            |e: io::Error| WatchError::store(path.display().to_string(), "Save", Some(anyhow::anyhow!(e)));

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(store_err)?;
            }
        }

        let tmp = temp_path(path);
        let file = fs::File::create(&tmp).map_err(store_err)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer).map_err(store_err)?;
        writer
            .into_inner()
            .map_err(|e| store_err(e.into_error()))?
            .sync_all()
            .map_err(store_err)?;
        fs::rename(&tmp, path).map_err(store_err)?;

        tracing::info!(path = %path.display(), entries = self.len(), "saved price store");
        Ok(())
    }

    /// Writes the store in file format to any writer.
    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        for (url, price) in &self.prices {
            writeln!(w, "{},{}", url, price)?;
        }
        Ok(())
    }

    /// Baseline built from reference prices in the watchlist, for runs
    /// without a store file.
    pub fn from_references<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a WatchEntry>,
    {
        let mut store = Self::new();
        for entry in entries {
            if let Some(price) = entry.reference_price {
                store.insert(entry.url.clone(), price);
            }
        }
        store
    }

    pub fn get(&self, url: &str) -> Option<Price> {
        self.prices.get(url).copied()
    }

    /// Records a price, returning the one it replaced.
    pub fn insert(&mut self, url: impl Into<String>, price: Price) -> Option<Price> {
        self.prices.insert(url.into(), price)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.prices.contains_key(url)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Price> {
        self.prices.iter()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl FromIterator<(String, Price)> for PriceStore {
    fn from_iter<T: IntoIterator<Item = (String, Price)>>(iter: T) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

fn parse_record(line: &str) -> Option<(String, Price)> {
    let mut cols = line.split(',');
    let url = cols.next()?.trim();
    let price = cols.next()?.trim();
    if cols.next().is_some() || url.is_empty() {
        return None;
    }
    let price = price.parse().ok()?;
    Some((url.to_string(), price))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
