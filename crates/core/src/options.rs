// ABOUTME: Fetch configuration (timeout, User-Agent, extra headers) and its fluent builder.
// ABOUTME: FetcherBuilder produces an HttpFetcher from the configured Options.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::WatchError;
use crate::fetch::HttpFetcher;

/// Desktop browser User-Agent sent with every product page request.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for page fetching.
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: HashMap::new(),
        }
    }
}

/// Builder for [`HttpFetcher`] instances.
#[derive(Debug, Clone, Default)]
pub struct FetcherBuilder {
    opts: Options,
}

impl FetcherBuilder {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Returns the options accumulated so far.
    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Build the fetcher.
    pub fn build(self) -> Result<HttpFetcher, WatchError> {
        HttpFetcher::new(self.opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_browser_like_and_finite() {
        let opts = Options::default();
        assert!(opts.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(opts.timeout, Duration::from_secs(30));
        assert!(opts.headers.is_empty());
    }

    #[test]
    fn builder_overrides() {
        let builder = FetcherBuilder::new()
            .timeout(Duration::from_secs(5))
            .user_agent("test-agent")
            .header("Accept-Language", "en-IN");
        let opts = builder.options();
        assert_eq!(opts.timeout, Duration::from_secs(5));
        assert_eq!(opts.user_agent, "test-agent");
        assert_eq!(opts.headers.get("Accept-Language").map(String::as_str), Some("en-IN"));
        assert!(builder.build().is_ok());
    }
}
