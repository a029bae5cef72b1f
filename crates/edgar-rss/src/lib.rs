#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/edgar-rss/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod download;
pub mod error;
pub mod feed;
pub mod indexer;
pub mod lookup;
pub mod period;
pub mod record;
pub mod store;

pub use config::{IndexerConfig, WorkDir};
pub use error::{EdgarError, Result};
pub use indexer::{IndexSummary, PeriodReport, SecIndexer};
pub use period::{Period, PeriodRange};
pub use record::{FeedField, FilingRecord};
pub use store::{FeedStore, FilingQuery, FormFilter, MergeMode, MergeSummary};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
