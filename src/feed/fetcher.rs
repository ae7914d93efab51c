//! HTTP feed fetcher with retry and SSRF protection.
//!
//! Transient failures (timeouts, connection errors, 5xx responses) are
//! retried with exponential backoff. Client errors are returned at once.

use std::net::IpAddr;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::FetcherConfig;
use crate::enrich::text::html_to_text;
use crate::feed::types::FetchedFeed;
use crate::{PerspectivaError, Result};

/// Upper bound for the first retry delay.
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(60);

/// Failure to retrieve a URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request did not complete within the timeout.
    #[error("timed out fetching {url}")]
    Timeout { url: String },

    /// DNS, TCP, TLS or body transfer failure.
    #[error("connection error fetching {url}: {message}")]
    Connection { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    /// The URL is malformed or points somewhere we refuse to go.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The response body exceeds the configured limit.
    #[error("response from {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: u64 },
}

impl FetchError {
    /// Whether a retry could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Connection { .. } => true,
            FetchError::HttpStatus { status, .. } => *status >= 500,
            FetchError::InvalidUrl { .. } | FetchError::TooLarge { .. } => false,
        }
    }

    fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Connection {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }
}

/// Feed fetcher.
///
/// Cheap to share behind an `Arc`; the underlying client pools connections.
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
}

impl Fetcher {
    /// Create a fetcher from configuration.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| PerspectivaError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Fetch a feed, retrying transient failures.
    pub async fn fetch(&self, url: &str) -> std::result::Result<FetchedFeed, FetchError> {
        self.check_url(url)?;

        let mut backoff = retry_backoff(self.config.retry_backoff_ms);

        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(feed) => return Ok(feed),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = backoff
                        .next_backoff()
                        .unwrap_or(backoff.initial_interval);
                    warn!(
                        "Attempt {} for {} failed ({}), retrying in {:?}",
                        attempt, url, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<FetchedFeed, FetchError> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = self.read_body(url, response).await?;
        Ok(FetchedFeed {
            bytes,
            content_type,
        })
    }

    /// Read the body, aborting once it passes the size limit.
    async fn read_body(
        &self,
        url: &str,
        mut response: reqwest::Response,
    ) -> std::result::Result<Vec<u8>, FetchError> {
        let limit = self.config.max_feed_size_bytes;
        let too_large = || FetchError::TooLarge {
            url: url.to_string(),
            limit,
        };

        if let Some(content_length) = response.content_length() {
            if content_length > limit {
                return Err(too_large());
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?
        {
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    /// Best-effort fetch of an article page as plain text.
    ///
    /// A single attempt; any failure, non-200 status or empty page yields `None`.
    pub async fn fetch_page_text(&self, url: &str) -> Option<String> {
        if let Err(e) = self.check_url(url) {
            debug!("Skipping full text for {}: {}", url, e);
            return None;
        }

        let page = match self.fetch_once(url).await {
            Ok(page) => page,
            Err(e) => {
                debug!("Full text fetch failed for {}: {}", url, e);
                return None;
            }
        };

        let html = String::from_utf8_lossy(&page.bytes);
        let text = html_to_text(&html);
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn check_url(&self, url: &str) -> std::result::Result<(), FetchError> {
        if self.config.allow_private_hosts {
            validate_scheme(url).map(|_| ())
        } else {
            validate_url(url)
        }
    }
}

fn invalid(url: &str, reason: impl Into<String>) -> FetchError {
    FetchError::InvalidUrl {
        url: url.to_string(),
        reason: reason.into(),
    }
}

fn validate_scheme(url: &str) -> std::result::Result<url::Url, FetchError> {
    let parsed = url::Url::parse(url).map_err(|e| invalid(url, e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(invalid(url, format!("unsupported URL scheme: {scheme}"))),
    }
}

/// Exponential backoff starting at `initial_ms`, capped at 16 times that.
fn retry_backoff(initial_ms: u64) -> ExponentialBackoff {
    let initial = Duration::from_millis(initial_ms).min(MAX_RETRY_BACKOFF);
    ExponentialBackoff {
        current_interval: initial,
        initial_interval: initial,
        randomization_factor: 0.1,
        multiplier: 2.0,
        max_interval: initial * 16,
        max_elapsed_time: None,
        ..Default::default()
    }
}

/// Validate a URL for SSRF protection.
///
/// Only http and https are accepted, and the host must not be a private,
/// loopback or reserved address or hostname.
pub fn validate_url(url: &str) -> std::result::Result<(), FetchError> {
    let parsed = validate_scheme(url)?;

    let host = parsed.host().ok_or_else(|| invalid(url, "URL has no host"))?;

    match host {
        url::Host::Domain(domain) => {
            if is_forbidden_hostname(domain) {
                return Err(invalid(url, format!("forbidden host: {domain}")));
            }
        }
        url::Host::Ipv4(ipv4) => {
            let ip = IpAddr::V4(ipv4);
            if is_private_ip(&ip) {
                return Err(invalid(url, format!("private IP address not allowed: {ip}")));
            }
        }
        url::Host::Ipv6(ipv6) => {
            let ip = IpAddr::V6(ipv6);
            if is_private_ip(&ip) {
                return Err(invalid(url, format!("private IP address not allowed: {ip}")));
            }
        }
    }

    Ok(())
}

fn is_forbidden_hostname(host: &str) -> bool {
    const FORBIDDEN_SUFFIXES: [&str; 7] = [
        ".local",
        ".localhost",
        ".internal",
        ".intranet",
        ".corp",
        ".home",
        ".lan",
    ];

    let host = host.to_lowercase();
    host == "localhost" || FORBIDDEN_SUFFIXES.iter().any(|s| host.ends_with(s))
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let [a, b, c, _] = ipv4.octets();
            ipv4.is_loopback()
                || ipv4.is_private()
                || ipv4.is_link_local()
                || ipv4.is_broadcast()
                || ipv4.is_unspecified()
                // carrier-grade NAT 100.64.0.0/10
                || (a == 100 && (64..=127).contains(&b))
                // documentation ranges
                || (a == 192 && b == 0 && c == 2)
                || (a == 198 && b == 51 && c == 100)
                || (a == 203 && b == 0 && c == 113)
        }
        IpAddr::V6(ipv6) => {
            if let Some(mapped) = ipv6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(mapped));
            }
            let first = ipv6.segments()[0];
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                // unique local fc00::/7
                || (first & 0xfe00) == 0xfc00
                // link-local fe80::/10
                || (first & 0xffc0) == 0xfe80
        }
    }
}
