//! Per-feed ingestion: fetch, parse, enrich, store, evict.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::article::{ArticleRepository, EnrichmentState, NewArticle, SourceRepository};
use crate::config::IngestConfig;
use crate::db::Database;
use crate::enrich::Enricher;
use crate::feed::{parse_feed, CandidateItem, FeedSource, Fetcher};
use crate::ingest::report::FeedOutcome;
use crate::Result;

/// What storing one item did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemResult {
    Inserted,
    Updated,
    Unchanged,
}

/// Ingests single feeds. Shared by all workers of a cycle.
pub struct IngestPipeline {
    db: Arc<Database>,
    fetcher: Arc<Fetcher>,
    enricher: Enricher,
    max_items_per_feed: usize,
    fetch_full_text: bool,
}

impl IngestPipeline {
    pub fn new(
        db: Arc<Database>,
        fetcher: Arc<Fetcher>,
        enricher: Enricher,
        config: &IngestConfig,
    ) -> Self {
        Self {
            db,
            fetcher,
            enricher,
            max_items_per_feed: config.max_items_per_feed,
            fetch_full_text: config.fetch_full_text,
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Ingest one feed. Failures are recorded in the outcome, never returned.
    pub async fn ingest_feed(&self, source: &FeedSource) -> FeedOutcome {
        debug!("Ingesting feed {}", source.url);

        let mut outcome = FeedOutcome::new(&source.url);
        if let Err(e) = self.try_ingest_feed(source, &mut outcome).await {
            warn!("Feed {} failed: {}", source.url, e);
            outcome.error = Some(e.to_string());
        } else if outcome.inserted > 0 {
            info!(
                "Feed {}: {} new, {} updated, {} evicted",
                source.url, outcome.inserted, outcome.updated, outcome.evicted
            );
        } else {
            debug!("Feed {}: no new items", source.url);
        }
        outcome
    }

    async fn try_ingest_feed(&self, source: &FeedSource, outcome: &mut FeedOutcome) -> Result<()> {
        let fetched = self.fetcher.fetch(&source.url).await?;
        let parsed = parse_feed(&fetched.bytes, &source.url, self.max_items_per_feed)?;
        outcome.items_seen = parsed.items.len();

        let name = source.display_name(parsed.title.as_deref());
        let sources = SourceRepository::new(self.db.pool());
        let stored_source = retry_storage(&source.url, || sources.upsert(&source.url, &name)).await?;

        for item in parsed.items {
            match self.ingest_item(stored_source.id, item).await {
                Ok(ItemResult::Inserted) => outcome.inserted += 1,
                Ok(ItemResult::Updated) => outcome.updated += 1,
                Ok(ItemResult::Unchanged) => outcome.unchanged += 1,
                Err(e) => {
                    error!("Dropping item from {} for this cycle: {}", source.url, e);
                    outcome.failed_items += 1;
                }
            }
        }

        let articles = ArticleRepository::new(self.db.pool());
        outcome.evicted = retry_storage(&source.url, || {
            articles.evict_excess(stored_source.id, self.max_items_per_feed)
        })
        .await?;

        Ok(())
    }

    async fn ingest_item(&self, source_id: i64, mut item: CandidateItem) -> Result<ItemResult> {
        let articles = ArticleRepository::new(self.db.pool());

        let state = retry_storage(&item.url, || articles.enrichment_state(&item.url)).await?;
        if state == EnrichmentState::Enriched {
            retry_storage(&item.url, || articles.touch(&item.url)).await?;
            return Ok(ItemResult::Unchanged);
        }

        let body_missing = item.body.as_deref().map_or(true, |b| b.trim().is_empty());
        if body_missing && self.fetch_full_text {
            if let Some(text) = self.fetcher.fetch_page_text(&item.url).await {
                item.body = Some(text);
            }
        }

        let mut article = NewArticle::from_candidate(source_id, &item);
        match self.enricher.enrich(item.body.as_deref()) {
            Ok(enrichment) => article = article.with_enrichment(enrichment),
            Err(e) => warn!("Storing {} without summary: {}", item.url, e),
        }

        let stored = retry_storage(&item.url, || articles.upsert(&article)).await?;
        if stored.inserted {
            debug!("Inserted article {} ({})", stored.id, item.url);
            Ok(ItemResult::Inserted)
        } else {
            Ok(ItemResult::Updated)
        }
    }
}

/// Run a storage operation, retrying once on a database error.
async fn retry_storage<T, F, Fut>(what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match op().await {
        Err(e) if e.is_storage() => {
            warn!("Storage error for {}, retrying once: {}", what, e);
            op().await
        }
        result => result,
    }
}
