//! Article storage: deduplicated by URL and bounded per source.

mod repository;
mod types;

pub use repository::{ArticleRepository, SourceRepository};
pub use types::{
    Article, ArticleQuery, EnrichmentState, NewArticle, Source, UpsertOutcome, DEFAULT_LIMIT,
    MAX_LIMIT,
};
