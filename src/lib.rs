//! Perspectiva - news feed ingestion
//!
//! Periodically polls RSS/Atom feeds, stores each article once by URL,
//! derives an extractive summary and a sentiment label, and keeps only the
//! most recent articles per source.

pub mod article;
pub mod config;
pub mod db;
pub mod enrich;
pub mod error;
pub mod feed;
pub mod ingest;
pub mod logging;

pub use article::{Article, ArticleQuery, ArticleRepository, Source, SourceRepository};
pub use config::Config;
pub use db::Database;
pub use enrich::{Enricher, Enrichment, EnrichmentError, Sentiment};
pub use error::{PerspectivaError, Result};
pub use feed::{FeedRegistry, FeedSource, FetchError, Fetcher};
pub use ingest::{
    CycleReport, FeedOutcome, HealthMonitor, HealthSnapshot, IngestPipeline, Scheduler,
    SchedulerContext, ShutdownHandle,
};
