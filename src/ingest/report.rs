//! Per-feed and per-cycle outcomes.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What happened to one feed during a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedOutcome {
    /// Feed URL.
    pub source_url: String,
    /// Items returned by the parser (after the per-feed cap).
    pub items_seen: usize,
    /// New articles stored.
    pub inserted: usize,
    /// Existing articles that were refreshed or filled in.
    pub updated: usize,
    /// Already-enriched articles that were only touched.
    pub unchanged: usize,
    /// Items dropped after a storage failure.
    pub failed_items: usize,
    /// Articles removed by the per-source cap.
    pub evicted: u64,
    /// Feed-level failure (fetch, parse or storage).
    pub error: Option<String>,
}

impl FeedOutcome {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            ..Self::default()
        }
    }

    /// Whether the feed was fetched, parsed and stored without a feed-level error.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of one ingestion cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Outcomes in registry order.
    pub feeds: Vec<FeedOutcome>,
    /// Shutdown was requested before every feed was dispatched.
    pub interrupted: bool,
}

impl CycleReport {
    pub fn inserted(&self) -> usize {
        self.feeds.iter().map(|f| f.inserted).sum()
    }

    pub fn failed_feeds(&self) -> usize {
        self.feeds.iter().filter(|f| !f.is_success()).count()
    }

    /// Outcome for a feed URL.
    pub fn feed(&self, source_url: &str) -> Option<&FeedOutcome> {
        self.feeds.iter().find(|f| f.source_url == source_url)
    }
}
