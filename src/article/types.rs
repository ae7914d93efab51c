//! Article and source types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::enrich::{Enrichment, Sentiment};
use crate::feed::CandidateItem;

/// Default page size for [`ArticleQuery`].
pub const DEFAULT_LIMIT: i64 = 50;

/// Largest page size for [`ArticleQuery`].
pub const MAX_LIMIT: i64 = 200;

/// A stored feed source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    /// Source ID.
    pub id: i64,
    /// Feed URL.
    pub url: String,
    /// Display name.
    pub name: String,
    /// When the source was first stored.
    pub created_at: DateTime<Utc>,
}

/// A stored article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    /// Article ID.
    pub id: i64,
    /// Source ID.
    pub source_id: i64,
    /// Source display name.
    pub source_name: String,
    /// Source feed URL.
    pub source_url: String,
    /// Article title.
    pub title: String,
    /// Canonical article URL (unique).
    pub url: String,
    /// Publication time from the feed.
    pub published_at: Option<DateTime<Utc>>,
    /// Plain-text body. Omitted from listings unless requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
    /// Extractive summary, null until enrichment succeeds.
    pub summary: Option<String>,
    /// Sentiment label, null until enrichment succeeds.
    pub sentiment: Option<Sentiment>,
    /// First ingestion time. Never changes.
    pub ingested_at: DateTime<Utc>,
    /// Last time the URL appeared in its feed.
    pub last_seen_at: DateTime<Utc>,
}

impl Article {
    /// Whether summary and sentiment have both been derived.
    pub fn is_enriched(&self) -> bool {
        self.summary.is_some() && self.sentiment.is_some()
    }
}

/// Data for inserting or refreshing an article.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub source_id: i64,
    pub url: String,
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
    pub full_text: Option<String>,
    pub summary: Option<String>,
    pub sentiment: Option<Sentiment>,
}

impl NewArticle {
    /// Create a new article without body or derived fields.
    pub fn new(source_id: i64, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source_id,
            url: url.into(),
            title: title.into(),
            published_at: None,
            full_text: None,
            summary: None,
            sentiment: None,
        }
    }

    /// Build from a parsed candidate, carrying over its body as full text.
    pub fn from_candidate(source_id: i64, item: &CandidateItem) -> Self {
        Self {
            source_id,
            url: item.url.clone(),
            title: item.title.clone(),
            published_at: item.published_at,
            full_text: item.body.clone(),
            summary: None,
            sentiment: None,
        }
    }

    /// Set the publication time.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    /// Set the full text.
    pub fn with_full_text(mut self, full_text: impl Into<String>) -> Self {
        self.full_text = Some(full_text.into());
        self
    }

    /// Attach derived fields.
    pub fn with_enrichment(mut self, enrichment: Enrichment) -> Self {
        self.summary = Some(enrichment.summary);
        self.sentiment = Some(enrichment.sentiment);
        self
    }
}

/// Result of [`ArticleRepository::upsert`](super::ArticleRepository::upsert).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// ID of the inserted or existing row.
    pub id: i64,
    /// True if a new row was created.
    pub inserted: bool,
}

/// What the store already holds for a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentState {
    /// No article with this URL.
    Missing,
    /// Stored, but summary or sentiment is null.
    Unenriched,
    /// Stored with both derived fields.
    Enriched,
}

/// Filters and pagination for listing articles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleQuery {
    /// Only articles from this feed URL.
    pub source_url: Option<String>,
    /// Page size, within `1..=MAX_LIMIT`.
    pub limit: i64,
    /// Rows to skip.
    pub offset: i64,
    /// Include `full_text` in results.
    pub include_full_text: bool,
}

impl Default for ArticleQuery {
    fn default() -> Self {
        Self {
            source_url: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
            include_full_text: false,
        }
    }
}

impl ArticleQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source_url: impl Into<String>) -> Self {
        self.source_url = Some(source_url.into());
        self
    }

    /// Set the page size, clamped to `1..=MAX_LIMIT`.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self
    }

    /// Set the offset. Negative values become zero.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset.max(0);
        self
    }

    pub fn with_full_text(mut self, include: bool) -> Self {
        self.include_full_text = include;
        self
    }
}
