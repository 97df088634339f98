//! Fire incident ingestion library.
//!
//! Provides the daily incident snapshot used by every later stage:
//!
//! - [`feed`]: where incidents come from ([`FeedSource`], [`RssFeedSource`])
//! - [`normalize`]: XML to JSON in the attribute/text key convention the
//!   snapshot files use (`@attr`, `#text`)
//! - [`cache`]: the fetch-or-reuse decision per calendar day ([`IngestionCache`])

pub mod cache;
pub mod error;
pub mod feed;
pub mod normalize;

// Re-exports
pub use cache::{IngestionCache, Resolution};
pub use error::{IngestionError, Result};
pub use feed::{FeedSource, RssFeedSource};
pub use normalize::xml_to_json;
