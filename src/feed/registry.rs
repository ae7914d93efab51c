//! The set of feeds polled each cycle.

use std::collections::HashSet;

use crate::config::FeedConfig;
use crate::feed::types::FeedSource;

/// Ordered, deduplicated list of feed sources.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct FeedRegistry {
    sources: Vec<FeedSource>,
}

impl FeedRegistry {
    /// Build a registry from configured feeds, keeping the first entry for
    /// each URL.
    pub fn from_config(feeds: &[FeedConfig]) -> Self {
        Self::new(feeds.iter().map(FeedSource::from))
    }

    /// Build a registry from sources, keeping the first entry for each URL.
    pub fn new(sources: impl IntoIterator<Item = FeedSource>) -> Self {
        let mut seen = HashSet::new();
        let sources = sources
            .into_iter()
            .filter(|s| seen.insert(s.url.clone()))
            .collect();
        Self { sources }
    }

    /// Sources in configured order.
    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    /// Look up a source by URL.
    pub fn get(&self, url: &str) -> Option<&FeedSource> {
        self.sources.iter().find(|s| s.url == url)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
