//! Database schema and migrations for Perspectiva.
//!
//! Each migration is applied once, in order, and recorded in the
//! `schema_version` table. Timestamps are stored as RFC 3339 text
//! (see [`crate::db::format_timestamp`]).

/// Database migrations.
#[cfg(feature = "sqlite")]
pub const MIGRATIONS: &[&str] = &[
    // v1: Feed sources
    r#"
CREATE TABLE sources (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    url         TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
"#,
    // v2: Articles, unique by url
    r#"
CREATE TABLE articles (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id     INTEGER NOT NULL REFERENCES sources(id) ON DELETE CASCADE,
    url           TEXT NOT NULL UNIQUE,
    title         TEXT NOT NULL,
    published_at  TEXT,
    full_text     TEXT,
    summary       TEXT,
    sentiment     TEXT CHECK (sentiment IN ('positive', 'neutral', 'negative')),
    ingested_at   TEXT NOT NULL,
    last_seen_at  TEXT NOT NULL
);

CREATE INDEX idx_articles_source_id ON articles(source_id);
CREATE INDEX idx_articles_published_at ON articles(published_at);
"#,
    // v3: Count of cycles that have seen each article
    r#"
ALTER TABLE articles ADD COLUMN seen_count INTEGER NOT NULL DEFAULT 1;
"#,
];

/// Database migrations.
#[cfg(feature = "postgres")]
pub const MIGRATIONS: &[&str] = &[
    // v1: Feed sources
    r#"
CREATE TABLE sources (
    id          BIGSERIAL PRIMARY KEY,
    url         TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
"#,
    // v2: Articles, unique by url
    r#"
CREATE TABLE articles (
    id            BIGSERIAL PRIMARY KEY,
    source_id     BIGINT NOT NULL REFERENCES sources(id) ON DELETE CASCADE,
    url           TEXT NOT NULL UNIQUE,
    title         TEXT NOT NULL,
    published_at  TEXT,
    full_text     TEXT,
    summary       TEXT,
    sentiment     TEXT CHECK (sentiment IN ('positive', 'neutral', 'negative')),
    ingested_at   TEXT NOT NULL,
    last_seen_at  TEXT NOT NULL
);

CREATE INDEX idx_articles_source_id ON articles(source_id);
CREATE INDEX idx_articles_published_at ON articles(published_at);
"#,
    // v3: Count of cycles that have seen each article
    r#"
ALTER TABLE articles ADD COLUMN seen_count BIGINT NOT NULL DEFAULT 1;
"#,
];
