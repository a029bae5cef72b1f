//! Monthly XBRL feed fetching and parsing.

pub mod fetch;
pub mod parse;

pub use fetch::{FeedFetcher, feed_filename};
pub use parse::{EDGAR_NS, FeedWarning, INSTANCE_DOCUMENT_TYPES, ParsedFeed, parse_feed, parse_feed_file};
