//! Test helpers for integration tests.
//!
//! Provides a local HTTP server serving fixture feeds, RSS builders and a
//! scheduler factory wired to an in-memory database.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use chrono::{DateTime, Utc};

use perspectiva::config::FeedConfig;
use perspectiva::{
    Config, Database, Enricher, FeedRegistry, Fetcher, IngestPipeline, Scheduler,
    SchedulerContext,
};

/// How the fixture server answers a path.
#[derive(Debug, Clone)]
pub enum Fixture {
    /// 200 with an RSS body.
    Feed(String),
    /// 200 with an HTML body.
    Page(String),
    /// A bare status code.
    Status(u16),
    /// `status` for the first `times` requests, then the body.
    FailThenFeed {
        status: u16,
        times: usize,
        body: String,
    },
    /// The body after a delay.
    Slow { delay: Duration, body: String },
}

#[derive(Default)]
struct ServerState {
    fixtures: Mutex<HashMap<String, Fixture>>,
    hits: Mutex<HashMap<String, usize>>,
}

/// Local HTTP server for fixture feeds.
#[derive(Clone)]
pub struct FixtureServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
}

impl FixtureServer {
    /// Start a server on an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(ServerState::default());
        let app = Router::new()
            .fallback(serve_fixture)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Absolute URL for a path on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Register (or replace) the fixture for a path.
    pub fn set(&self, path: &str, fixture: Fixture) {
        self.state
            .fixtures
            .lock()
            .unwrap()
            .insert(path.to_string(), fixture);
    }

    /// Number of requests received for a path.
    pub fn hits(&self, path: &str) -> usize {
        self.state
            .hits
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

async fn serve_fixture(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    let hit = {
        let mut hits = state.hits.lock().unwrap();
        let count = hits.entry(path.clone()).or_insert(0);
        *count += 1;
        *count
    };
    let fixture = state.fixtures.lock().unwrap().get(&path).cloned();

    match fixture {
        None => StatusCode::NOT_FOUND.into_response(),
        Some(Fixture::Feed(body)) => rss_response(body),
        Some(Fixture::Page(body)) => {
            ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response()
        }
        Some(Fixture::Status(status)) => status_code(status).into_response(),
        Some(Fixture::FailThenFeed {
            status,
            times,
            body,
        }) => {
            if hit <= times {
                status_code(status).into_response()
            } else {
                rss_response(body)
            }
        }
        Some(Fixture::Slow { delay, body }) => {
            tokio::time::sleep(delay).await;
            rss_response(body)
        }
    }
}

fn rss_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/rss+xml")], body).into_response()
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap()
}

/// One `<item>` of a fixture feed.
#[derive(Debug, Clone)]
pub struct TestItem {
    pub link: String,
    pub title: String,
    pub description: Option<String>,
    pub pub_date: Option<DateTime<Utc>>,
}

impl TestItem {
    pub fn new(link: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
            description: None,
            pub_date: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_pub_date(mut self, pub_date: DateTime<Utc>) -> Self {
        self.pub_date = Some(pub_date);
        self
    }
}

/// Build an RSS 2.0 document.
pub fn rss_feed(title: &str, items: &[TestItem]) -> String {
    let items: String = items
        .iter()
        .map(|item| {
            let mut xml = format!(
                "<item><title>{}</title><link>{}</link>",
                escape(&item.title),
                escape(&item.link)
            );
            if let Some(description) = &item.description {
                xml.push_str(&format!("<description>{}</description>", escape(description)));
            }
            if let Some(pub_date) = item.pub_date {
                xml.push_str(&format!("<pubDate>{}</pubDate>", pub_date.to_rfc2822()));
            }
            xml.push_str("</item>");
            xml
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>{}</title><link>https://example.com/</link><description>Fixture</description>{}</channel></rss>"#,
        escape(title),
        items
    )
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Configuration pointing at fixture feeds, with fast retries.
pub fn test_config(feed_urls: &[String]) -> Config {
    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();
    config.feeds = feed_urls.iter().map(FeedConfig::new).collect();
    config.ingest.fetch_full_text = false;
    config.fetcher.allow_private_hosts = true;
    config.fetcher.retry_backoff_ms = 10;
    config.fetcher.timeout_secs = 5;
    config
}

/// Open an in-memory database.
pub async fn setup_db() -> Arc<Database> {
    Arc::new(Database::open_in_memory().await.unwrap())
}

/// Build a scheduler for `config` on top of `db`.
pub fn build_scheduler(db: Arc<Database>, config: &Config) -> Scheduler {
    let fetcher = Arc::new(Fetcher::new(&config.fetcher).unwrap());
    let enricher = Enricher::new(
        config.ingest.summary_sentences,
        config.ingest.max_enrich_input_bytes,
    );
    let pipeline = Arc::new(IngestPipeline::new(db, fetcher, enricher, &config.ingest));
    let registry = Arc::new(FeedRegistry::from_config(&config.feeds));
    Scheduler::new(SchedulerContext::new(), registry, pipeline, &config.ingest)
}
