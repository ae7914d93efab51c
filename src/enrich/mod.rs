//! Article enrichment: extractive summary and sentiment label.
//!
//! Enrichment is a pure function of the body text, so re-enriching the
//! same text always gives the same result.

pub mod sentiment;
pub mod summarize;
pub mod text;

pub use sentiment::Sentiment;

use thiserror::Error;

/// Failure to derive a summary or sentiment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentError {
    /// Body larger than the configured enrichment limit.
    #[error("input of {size} bytes exceeds the {limit} byte enrichment limit")]
    InputTooLarge { size: usize, limit: usize },
}

/// Derived fields for one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub summary: String,
    pub sentiment: Sentiment,
}

/// Produces summaries and sentiment labels.
#[derive(Debug, Clone)]
pub struct Enricher {
    summary_sentences: usize,
    max_input_bytes: usize,
}

impl Enricher {
    pub fn new(summary_sentences: usize, max_input_bytes: usize) -> Self {
        Self {
            summary_sentences,
            max_input_bytes,
        }
    }

    pub fn summary_sentences(&self) -> usize {
        self.summary_sentences
    }

    /// Enrich a body. Absent, empty or whitespace-only bodies yield an empty
    /// summary and a neutral label.
    pub fn enrich(&self, body: Option<&str>) -> Result<Enrichment, EnrichmentError> {
        let body = body.unwrap_or_default();
        if body.len() > self.max_input_bytes {
            return Err(EnrichmentError::InputTooLarge {
                size: body.len(),
                limit: self.max_input_bytes,
            });
        }
        if body.trim().is_empty() {
            return Ok(Enrichment {
                summary: String::new(),
                sentiment: Sentiment::Neutral,
            });
        }

        Ok(Enrichment {
            summary: summarize::summarize(body, self.summary_sentences),
            sentiment: sentiment::classify(body),
        })
    }
}
