//! Configuration module for Perspectiva.
//!
//! Configuration is read from an optional TOML file and then overridden by
//! environment variables (`DATABASE_URL`, `FEEDS`, `FETCH_INTERVAL_SECONDS`,
//! `MAX_ITEMS_PER_FEED`, `SUMMARY_SENTENCES`, `LOG_LEVEL`). Everything is
//! validated once at startup; an invalid value is fatal.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::{PerspectivaError, Result};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string (`sqlite://...` or `postgres://...`).
    #[serde(default = "default_database_url")]
    pub url: String,
}

fn default_database_url() -> String {
    "sqlite://data/perspectiva.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

/// Ingestion cycle configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Seconds between cycle starts.
    #[serde(default = "default_fetch_interval")]
    pub fetch_interval_secs: u64,
    /// Maximum items taken from one feed and retained per source.
    #[serde(default = "default_max_items_per_feed")]
    pub max_items_per_feed: usize,
    /// Number of sentences in a generated summary.
    #[serde(default = "default_summary_sentences")]
    pub summary_sentences: usize,
    /// Size of the per-cycle feed worker pool.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    /// Fetch the article page when a feed entry carries no body text.
    #[serde(default = "default_fetch_full_text")]
    pub fetch_full_text: bool,
    /// Largest body (in bytes) the enricher accepts.
    #[serde(default = "default_max_enrich_input_bytes")]
    pub max_enrich_input_bytes: usize,
}

fn default_fetch_interval() -> u64 {
    300 // 5 minutes
}

fn default_max_items_per_feed() -> usize {
    15
}

fn default_summary_sentences() -> usize {
    3
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_fetch_full_text() -> bool {
    true
}

fn default_max_enrich_input_bytes() -> usize {
    512 * 1024
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            fetch_interval_secs: default_fetch_interval(),
            max_items_per_feed: default_max_items_per_feed(),
            summary_sentences: default_summary_sentences(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            fetch_full_text: default_fetch_full_text(),
            max_enrich_input_bytes: default_max_enrich_input_bytes(),
        }
    }
}

/// HTTP fetcher configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Retries after the first attempt for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Initial backoff between retries in milliseconds (doubles each retry).
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Maximum feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Allow loopback and private network hosts.
    #[serde(default)]
    pub allow_private_hosts: bool,
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_timeout() -> u64 {
    15
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_user_agent() -> String {
    concat!("Perspectiva/", env!("CARGO_PKG_VERSION"), " (feed ingester)").to_string()
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_redirects: default_max_redirects(),
            max_feed_size_bytes: default_max_feed_size(),
            user_agent: default_user_agent(),
            allow_private_hosts: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file written in addition to stdout.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// One configured feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedConfig {
    /// Feed URL.
    pub url: String,
    /// Display name (falls back to the feed title).
    #[serde(default)]
    pub name: Option<String>,
}

impl FeedConfig {
    /// Create a feed entry without a display name.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

fn default_feeds() -> Vec<FeedConfig> {
    vec![
        FeedConfig::new("https://feeds.bbci.co.uk/news/rss.xml"),
        FeedConfig::new("https://rss.cnn.com/rss/edition.rss"),
    ]
}

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Ingestion configuration.
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Fetcher configuration.
    #[serde(default)]
    pub fetcher: FetcherConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Feed sources in processing order.
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            ingest: IngestConfig::default(),
            fetcher: FetcherConfig::default(),
            logging: LoggingConfig::default(),
            feeds: default_feeds(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(PerspectivaError::Io)?;
        Self::parse(&content)
    }

    /// Load the TOML file if it exists, apply environment overrides and validate.
    ///
    /// A missing file is not an error: defaults plus environment are used.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = if path.as_ref().exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| PerspectivaError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Empty values are ignored. Numeric values that do not parse are a
    /// configuration error rather than silently falling back.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(feeds) = get("FEEDS") {
            self.feeds = parse_feed_list(&feeds);
        }
        if let Some(v) = get("FETCH_INTERVAL_SECONDS") {
            self.ingest.fetch_interval_secs = parse_number("FETCH_INTERVAL_SECONDS", &v)?;
        }
        if let Some(v) = get("MAX_ITEMS_PER_FEED") {
            self.ingest.max_items_per_feed = parse_number("MAX_ITEMS_PER_FEED", &v)?;
        }
        if let Some(v) = get("SUMMARY_SENTENCES") {
            self.ingest.summary_sentences = parse_number("SUMMARY_SENTENCES", &v)?;
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.logging.level = level.trim().to_lowercase();
        }
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("fetch_interval_secs", self.ingest.fetch_interval_secs),
            ("max_items_per_feed", self.ingest.max_items_per_feed as u64),
            ("summary_sentences", self.ingest.summary_sentences as u64),
            (
                "max_concurrent_fetches",
                self.ingest.max_concurrent_fetches as u64,
            ),
            ("max_enrich_input_bytes", self.ingest.max_enrich_input_bytes as u64),
            ("fetcher.timeout_secs", self.fetcher.timeout_secs),
            ("fetcher.connect_timeout_secs", self.fetcher.connect_timeout_secs),
            ("fetcher.max_feed_size_bytes", self.fetcher.max_feed_size_bytes),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(PerspectivaError::Config(format!(
                    "{name} must be a positive integer"
                )));
            }
        }

        if self.database.url.trim().is_empty() {
            return Err(PerspectivaError::Config(
                "database url is empty".to_string(),
            ));
        }

        if self.feeds.is_empty() {
            return Err(PerspectivaError::Config(
                "no feeds configured (set [[feeds]] or FEEDS)".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for feed in &self.feeds {
            let parsed = url::Url::parse(&feed.url).map_err(|e| {
                PerspectivaError::Config(format!("invalid feed URL {:?}: {e}", feed.url))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(PerspectivaError::Config(format!(
                    "feed URL must use http or https: {}",
                    feed.url
                )));
            }
            if !seen.insert(feed.url.as_str()) {
                return Err(PerspectivaError::Config(format!(
                    "duplicate feed URL: {}",
                    feed.url
                )));
            }
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| {
        PerspectivaError::Config(format!("{key} must be a positive integer, got {value:?}"))
    })
}

/// Parse a comma separated feed list. Each entry is `url` or `Name|url`.
pub fn parse_feed_list(s: &str) -> Vec<FeedConfig> {
    s.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('|') {
            Some((name, url)) if !name.trim().is_empty() => {
                FeedConfig::new(url.trim()).with_name(name.trim())
            }
            Some((_, url)) => FeedConfig::new(url.trim()),
            None => FeedConfig::new(entry),
        })
        .collect()
}
