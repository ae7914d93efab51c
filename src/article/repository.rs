//! Article and source repositories.

use chrono::{DateTime, Utc};
use sqlx::QueryBuilder;
use tracing::warn;

use super::types::{
    Article, ArticleQuery, EnrichmentState, NewArticle, Source, UpsertOutcome,
};
use crate::db::{format_timestamp, parse_timestamp, Db, DbPool};
use crate::enrich::Sentiment;
use crate::{PerspectivaError, Result};

/// Row type for source from database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SourceRow {
    id: i64,
    url: String,
    name: String,
    created_at: String,
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        Source {
            id: row.id,
            url: row.url,
            name: row.name,
            created_at: parse_timestamp(&row.created_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Row type for article joined with its source.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    source_id: i64,
    source_name: String,
    source_url: String,
    title: String,
    url: String,
    published_at: Option<String>,
    full_text: Option<String>,
    summary: Option<String>,
    sentiment: Option<String>,
    ingested_at: String,
    last_seen_at: String,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        let sentiment = row.sentiment.and_then(|s| match s.parse::<Sentiment>() {
            Ok(sentiment) => Some(sentiment),
            Err(e) => {
                warn!("Article {}: {}", row.id, e);
                None
            }
        });
        Article {
            id: row.id,
            source_id: row.source_id,
            source_name: row.source_name,
            source_url: row.source_url,
            title: row.title,
            url: row.url,
            published_at: row.published_at.and_then(|s| parse_timestamp(&s)),
            full_text: row.full_text,
            summary: row.summary,
            sentiment,
            ingested_at: parse_timestamp(&row.ingested_at).unwrap_or_else(Utc::now),
            last_seen_at: parse_timestamp(&row.last_seen_at).unwrap_or_else(Utc::now),
        }
    }
}

const ARTICLE_COLUMNS: &str = "a.id, a.source_id, s.name AS source_name, s.url AS source_url, \
     a.title, a.url, a.published_at, a.full_text, a.summary, a.sentiment, \
     a.ingested_at, a.last_seen_at";

/// Repository for feed sources.
pub struct SourceRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> SourceRepository<'a> {
    /// Create a new repository with the given pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a source, or update the display name of an existing one.
    pub async fn upsert(&self, url: &str, name: &str) -> Result<Source> {
        let row = sqlx::query_as::<_, SourceRow>(
            r#"
            INSERT INTO sources (url, name, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (url) DO UPDATE SET name = excluded.name
            RETURNING id, url, name, created_at
            "#,
        )
        .bind(url)
        .bind(name)
        .bind(format_timestamp(&Utc::now()))
        .fetch_one(self.pool)
        .await
        .map_err(|e| PerspectivaError::Database(e.to_string()))?;

        Ok(row.into())
    }

    /// Get a source by feed URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Source>> {
        let row = sqlx::query_as::<_, SourceRow>(
            "SELECT id, url, name, created_at FROM sources WHERE url = $1",
        )
        .bind(url)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| PerspectivaError::Database(e.to_string()))?;

        Ok(row.map(Source::from))
    }

    /// List all sources by name.
    pub async fn list(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query_as::<_, SourceRow>(
            "SELECT id, url, name, created_at FROM sources ORDER BY name, id",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| PerspectivaError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Source::from).collect())
    }
}

/// Repository for articles.
pub struct ArticleRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ArticleRepository<'a> {
    /// Create a new repository with the given pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert an article, or refresh the existing row with the same URL.
    ///
    /// On conflict only `last_seen_at` and `seen_count` are always updated. Null `full_text`,
    /// `summary` and `sentiment` are filled from the new values; non-null
    /// ones are kept. The whole operation is a single statement.
    pub async fn upsert(&self, article: &NewArticle) -> Result<UpsertOutcome> {
        self.upsert_at(article, Utc::now()).await
    }

    async fn upsert_at(&self, article: &NewArticle, now: DateTime<Utc>) -> Result<UpsertOutcome> {
        let now = format_timestamp(&now);

        let (id, seen_count): (i64, i64) = sqlx::query_as(
            r#"
            INSERT INTO articles (source_id, url, title, published_at, full_text,
                                  summary, sentiment, ingested_at, last_seen_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (url) DO UPDATE SET
                last_seen_at = excluded.last_seen_at,
                seen_count = articles.seen_count + 1,
                full_text = COALESCE(articles.full_text, excluded.full_text),
                summary = COALESCE(articles.summary, excluded.summary),
                sentiment = COALESCE(articles.sentiment, excluded.sentiment)
            RETURNING id, seen_count
            "#,
        )
        .bind(article.source_id)
        .bind(&article.url)
        .bind(&article.title)
        .bind(article.published_at.as_ref().map(format_timestamp))
        .bind(&article.full_text)
        .bind(&article.summary)
        .bind(article.sentiment.map(|s| s.as_str()))
        .bind(&now)
        .bind(&now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| PerspectivaError::Database(e.to_string()))?;

        Ok(UpsertOutcome {
            id,
            inserted: seen_count == 1,
        })
    }

    /// Check whether a URL is stored and already enriched.
    pub async fn enrichment_state(&self, url: &str) -> Result<EnrichmentState> {
        let row: Option<(Option<String>, Option<String>)> =
            sqlx::query_as("SELECT summary, sentiment FROM articles WHERE url = $1")
                .bind(url)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| PerspectivaError::Database(e.to_string()))?;

        Ok(match row {
            None => EnrichmentState::Missing,
            Some((Some(_), Some(_))) => EnrichmentState::Enriched,
            Some(_) => EnrichmentState::Unenriched,
        })
    }

    /// Refresh `last_seen_at` for a URL. Returns false if it is not stored.
    pub async fn touch(&self, url: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE articles SET last_seen_at = $1, seen_count = seen_count + 1 WHERE url = $2",
        )
        .bind(format_timestamp(&Utc::now()))
        .bind(url)
        .execute(self.pool)
        .await
        .map_err(|e| PerspectivaError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a source's articles beyond the `cap` most recent.
    ///
    /// Recency is `published_at`, falling back to `ingested_at` when the
    /// feed gave no date; ties go to the higher id.
    pub async fn evict_excess(&self, source_id: i64, cap: usize) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM articles
            WHERE source_id = $1
            AND id NOT IN (
                SELECT id FROM articles
                WHERE source_id = $2
                ORDER BY COALESCE(published_at, ingested_at) DESC, id DESC
                LIMIT $3
            )
            "#,
        )
        .bind(source_id)
        .bind(source_id)
        .bind(cap as i64)
        .execute(self.pool)
        .await
        .map_err(|e| PerspectivaError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// List articles newest first.
    pub async fn list(&self, query: &ArticleQuery) -> Result<Vec<Article>> {
        let mut builder: QueryBuilder<Db> = QueryBuilder::new("SELECT ");
        builder.push(ARTICLE_COLUMNS);
        builder.push(" FROM articles a JOIN sources s ON s.id = a.source_id");

        if let Some(source_url) = &query.source_url {
            builder.push(" WHERE s.url = ");
            builder.push_bind(source_url.clone());
        }

        builder.push(" ORDER BY COALESCE(a.published_at, a.ingested_at) DESC, a.id DESC");
        builder.push(" LIMIT ");
        builder.push_bind(query.limit);
        builder.push(" OFFSET ");
        builder.push_bind(query.offset);

        let rows = builder
            .build_query_as::<ArticleRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| PerspectivaError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut article = Article::from(row);
                if !query.include_full_text {
                    article.full_text = None;
                }
                article
            })
            .collect())
    }

    /// Get an article by ID, including its full text.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles a JOIN sources s ON s.id = a.source_id \
             WHERE a.id = $1"
        );
        let row = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| PerspectivaError::Database(e.to_string()))?;

        Ok(row.map(Article::from))
    }

    /// Count articles stored for a source.
    pub async fn count_by_source(&self, source_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles WHERE source_id = $1")
            .bind(source_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| PerspectivaError::Database(e.to_string()))?;

        Ok(count.0)
    }

    /// Count all articles.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(self.pool)
            .await
            .map_err(|e| PerspectivaError::Database(e.to_string()))?;

        Ok(count.0)
    }
}
