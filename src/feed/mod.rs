//! Feed sources, retrieval and parsing.

pub mod fetcher;
pub mod parser;
pub mod registry;
pub mod types;

pub use fetcher::{validate_url, FetchError, Fetcher};
pub use parser::parse_feed;
pub use registry::FeedRegistry;
pub use types::{CandidateItem, FeedSource, FetchedFeed, ParsedFeed};
