//! RSS and Atom parsing into candidate items.

use feed_rs::model::{Entry, FeedType, Link};
use feed_rs::parser;
use tracing::debug;

use crate::enrich::text::strip_html;
use crate::feed::types::{CandidateItem, ParsedFeed};
use crate::{PerspectivaError, Result};

/// Title used for entries that have none.
pub const UNTITLED: &str = "Untitled";

/// Parse a feed document.
///
/// Returns at most `max_items` items in document order. Entries without a
/// link are skipped. A document that is not RSS or Atom is an error, and no
/// partial result is returned.
pub fn parse_feed(bytes: &[u8], source_url: &str, max_items: usize) -> Result<ParsedFeed> {
    let feed = parser::parse(bytes)
        .map_err(|e| PerspectivaError::Parse(format!("{source_url}: {e}")))?;

    if matches!(feed.feed_type, FeedType::JSON) {
        return Err(PerspectivaError::Parse(format!(
            "{source_url}: JSON Feed is not supported"
        )));
    }

    let title = feed
        .title
        .map(|t| strip_html(&t.content))
        .filter(|t| !t.is_empty());

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| to_candidate(entry, source_url))
        .take(max_items)
        .collect();

    Ok(ParsedFeed { title, items })
}

fn to_candidate(entry: Entry, source_url: &str) -> Option<CandidateItem> {
    let title = entry
        .title
        .as_ref()
        .map(|t| strip_html(&t.content))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let Some(url) = entry_link(&entry.links) else {
        debug!("Skipping entry with no link: {}", title);
        return None;
    };

    let body = entry
        .content
        .and_then(|c| c.body)
        .map(|b| strip_html(&b))
        .filter(|b| !b.is_empty())
        .or_else(|| entry.summary.map(|s| strip_html(&s.content)));

    Some(CandidateItem {
        source_url: source_url.to_string(),
        url,
        title,
        published_at: entry.published.or(entry.updated),
        body,
    })
}

/// Pick the entry's canonical link: the first `alternate` (or unlabelled)
/// link, else the first link of any kind.
fn entry_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .map(|l| l.href.trim().to_string())
        .filter(|href| !href.is_empty())
}
