// ABOUTME: Page fetching: the PageFetcher trait and its blocking reqwest implementation.
// ABOUTME: Enforces http(s) URLs, a body size limit, and treats any non-200 status as a failure.

use std::collections::HashMap;
use std::io::{self, Read};

use crate::error::WatchError;
use crate::options::Options;

/// Maximum allowed body size (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Page {
    /// Wraps already-available bytes, e.g. a saved HTML file.
    pub fn from_bytes(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            content_type: None,
            body: body.into(),
        }
    }

    /// Decodes the body to text, using the Content-Type charset when present.
    pub fn text(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Retrieves product pages. Implementations must return `Err` for anything
/// other than a 200 response.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<Page, WatchError>;
}

/// Blocking HTTP fetcher with a browser-like User-Agent and a finite timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    headers: HashMap<String, String>,
}

impl HttpFetcher {
    /// Builds the underlying HTTP client from options.
    pub fn new(opts: Options) -> Result<Self, WatchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(opts.user_agent.clone())
            .timeout(opts.timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| WatchError::fetch("", "BuildClient", Some(anyhow::anyhow!(e))))?;
        Ok(Self {
            client,
            headers: opts.headers,
        })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Page, WatchError> {
        let parsed = url::Url::parse(url).map_err(|e| {
            WatchError::invalid_url(url, "Fetch", Some(anyhow::anyhow!("invalid URL: {}", e)))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(WatchError::invalid_url(
                url,
                "Fetch",
                Some(anyhow::anyhow!("scheme must be http or https")),
            ));
        }

        let mut request = self.client.get(parsed);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                WatchError::timeout(url, "Fetch", Some(anyhow::anyhow!(e)))
            } else {
                WatchError::fetch(url, "Fetch", Some(anyhow::anyhow!("request failed: {}", e)))
            }
        })?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(WatchError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("HTTP status {}", status)),
            ));
        }

        if let Some(len) = response.content_length() {
            if len as usize > MAX_CONTENT_LENGTH {
                return Err(WatchError::fetch(
                    url,
                    "Fetch",
                    Some(anyhow::anyhow!("content too large")),
                ));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_lowercase());

        let body = read_capped(response, MAX_CONTENT_LENGTH).map_err(|e| {
            if e.kind() == io::ErrorKind::TimedOut {
                WatchError::timeout(url, "Fetch", Some(anyhow::anyhow!(e)))
            } else {
                WatchError::fetch(
                    url,
                    "Fetch",
                    Some(anyhow::anyhow!("failed to read body: {}", e)),
                )
            }
        })?;
        let Some(body) = body else {
            return Err(WatchError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large")),
            ));
        };

        Ok(Page {
            url: url.to_string(),
            final_url,
            content_type,
            body,
        })
    }
}

/// Reads at most `limit` bytes; `None` if the body is longer.
/// Bodies without a Content-Length are cut off here instead of buffered whole.
fn read_capped<R: Read>(reader: R, limit: usize) -> io::Result<Option<Vec<u8>>> {
    let mut body = Vec::new();
    reader.take(limit as u64 + 1).read_to_end(&mut body)?;
    if body.len() > limit {
        return Ok(None);
    }
    Ok(Some(body))
}

/// Decode body bytes to a String using the charset from a Content-Type
/// header, or detection when absent or unknown.
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    lower.split(';').find_map(|part| {
        part.trim()
            .strip_prefix("charset=")
            .map(|c| c.trim_matches('"').trim_matches('\'').to_string())
    })
}
