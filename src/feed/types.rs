//! Feed-side data types.

use chrono::{DateTime, Utc};

use crate::config::FeedConfig;

/// A configured feed. Identity is the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    /// Feed URL.
    pub url: String,
    /// Configured display name.
    pub name: Option<String>,
}

impl FeedSource {
    /// Create a source without a display name.
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

    /// Name to store for this source.
    ///
    /// The configured name wins, then the feed's own title, then the URL host.
    pub fn display_name(&self, feed_title: Option<&str>) -> String {
        let non_empty = |s: &&str| !s.trim().is_empty();
        if let Some(name) = self.name.as_deref().filter(non_empty) {
            return name.trim().to_string();
        }
        if let Some(title) = feed_title.filter(non_empty) {
            return title.trim().to_string();
        }
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.url.clone())
    }
}

impl From<&FeedConfig> for FeedSource {
    fn from(config: &FeedConfig) -> Self {
        Self {
            url: config.url.clone(),
            name: config.name.clone(),
        }
    }
}

/// Raw response of a successful feed fetch.
#[derive(Debug, Clone)]
pub struct FetchedFeed {
    /// Response body.
    pub bytes: Vec<u8>,
    /// `Content-Type` header, if the server sent one.
    pub content_type: Option<String>,
}

/// An item extracted from a feed, before enrichment and storage.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateItem {
    /// URL of the feed this item came from.
    pub source_url: String,
    /// Canonical link of the item. Deduplication key.
    pub url: String,
    /// Item title.
    pub title: String,
    /// Publication time, if present and parseable.
    pub published_at: Option<DateTime<Utc>>,
    /// Plain-text body, if the feed gave one.
    pub body: Option<String>,
}

impl CandidateItem {
    /// Create a new candidate item.
    pub fn new(
        source_url: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            url: url.into(),
            title: title.into(),
            published_at: None,
            body: None,
        }
    }

    /// Set the publication time.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    /// Set the body text.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Result of parsing a feed document.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    /// The feed's own title.
    pub title: Option<String>,
    /// Items in document order.
    pub items: Vec<CandidateItem>,
}
