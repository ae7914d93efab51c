//! Error types for Perspectiva.

use thiserror::Error;

use crate::enrich::EnrichmentError;
use crate::feed::FetchError;

/// Common error type for Perspectiva.
#[derive(Error, Debug)]
pub enum PerspectivaError {
    /// Invalid or unreadable configuration. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Feed retrieval failed.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Feed document could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Summary or sentiment could not be derived.
    #[error("enrichment error: {0}")]
    Enrichment(#[from] EnrichmentError),

    /// Database error.
    ///
    /// Errors from sqlx are converted automatically.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),
}

impl PerspectivaError {
    /// Whether this error came from the storage backend.
    pub fn is_storage(&self) -> bool {
        matches!(self, PerspectivaError::Database(_))
    }
}

impl From<sqlx::Error> for PerspectivaError {
    fn from(e: sqlx::Error) -> Self {
        PerspectivaError::Database(e.to_string())
    }
}

/// Result type alias for Perspectiva operations.
pub type Result<T> = std::result::Result<T, PerspectivaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = PerspectivaError::Config("fetch_interval_secs must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: fetch_interval_secs must be positive"
        );
    }

    #[test]
    fn test_parse_error_display() {
        let err = PerspectivaError::Parse("unexpected end of document".to_string());
        assert_eq!(err.to_string(), "parse error: unexpected end of document");
    }

    #[test]
    fn test_fetch_error_conversion() {
        let err: PerspectivaError = FetchError::HttpStatus {
            url: "https://example.com/feed.xml".to_string(),
            status: 404,
        }
        .into();
        assert!(matches!(err, PerspectivaError::Fetch(_)));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_sqlx_error_is_storage() {
        let err: PerspectivaError = sqlx::Error::PoolClosed.into();
        assert!(err.is_storage());
        assert!(!PerspectivaError::NotFound("article".into()).is_storage());
    }

    #[test]
    fn test_not_found_error_display() {
        let err = PerspectivaError::NotFound("article".to_string());
        assert_eq!(err.to_string(), "article not found");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PerspectivaError = io_err.into();
        assert!(matches!(err, PerspectivaError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }
}
