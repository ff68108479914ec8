// ABOUTME: Error types for the price watcher including ErrorCode enum and WatchError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

/// Error codes representing the categories of pipeline failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    Fetch,
    Timeout,
    Extract,
    Store,
    Source,
    Notify,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::Fetch => "fetch error",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Extract => "extraction error",
            ErrorCode::Store => "price store error",
            ErrorCode::Source => "source list error",
            ErrorCode::Notify => "notification error",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for watcher operations.
///
/// `url` holds the product URL, file path or recipient the failure relates to.
#[derive(Debug, thiserror::Error)]
pub struct WatchError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pricewatch: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

macro_rules! constructor {
    ($(#[$doc:meta])* $name:ident => $code:ident) => {
        $(#[$doc])*
        pub fn $name(
            url: impl Into<String>,
            op: impl Into<String>,
            source: Option<anyhow::Error>,
        ) -> Self {
            Self {
                code: ErrorCode::$code,
                url: url.into(),
                op: op.into(),
                source,
            }
        }
    };
}

impl WatchError {
    constructor!(
        /// Create an InvalidUrl error.
        invalid_url => InvalidUrl
    );
    constructor!(
        /// Create a Fetch error.
        fetch => Fetch
    );
    constructor!(
        /// Create a Timeout error.
        timeout => Timeout
    );
    constructor!(
        /// Create an Extract error.
        extract => Extract
    );
    constructor!(
        /// Create a Store error.
        store => Store
    );
    constructor!(
        /// Create a Source error.
        source_list => Source
    );
    constructor!(
        /// Create a Notify error.
        notify => Notify
    );

    /// Returns true for failures that happen while retrieving a page
    /// (bad URL, transport error, non-200 status, timeout).
    pub fn is_fetch(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::Fetch | ErrorCode::Timeout | ErrorCode::InvalidUrl
        )
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if this is an Extract error.
    pub fn is_extract(&self) -> bool {
        self.code == ErrorCode::Extract
    }

    /// Returns true if this is a Store error.
    pub fn is_store(&self) -> bool {
        self.code == ErrorCode::Store
    }

    /// Short human-readable reason without the op/url prefix.
    pub fn reason(&self) -> String {
        match &self.source {
            Some(src) => format!("{}: {}", self.code, src),
            None => self.code.to_string(),
        }
    }
}
