//! Subcommand implementations.
//!
//! Each command drives the library through a [`SecIndexer`] and owns the
//! user-facing output: progress bars on stderr, results on stdout.

mod filings;
mod index;

pub(crate) use filings::{get_xbrl, list};
pub(crate) use index::get_rss;

use edgar_rss::SecIndexer;
use edgar_rss::lookup::CikResolver;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// Filers selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Filers {
    Cik(String),
    Ticker(String),
    /// One ticker per line
    TickerFile(PathBuf),
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn cik_resolver(indexer: &SecIndexer) -> edgar_rss::Result<CikResolver> {
    CikResolver::new(indexer.config())
}
