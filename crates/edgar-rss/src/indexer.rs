//! Feed indexing and filing download pipelines.
//!
//! [`SecIndexer::download_sec_feeds`] walks a range of months, fetches and
//! parses each monthly feed, and merges every parsed record into the store
//! in one batch. [`SecIndexer::download_xbrl_data`] later reads the store
//! and fetches the instance documents of one filer.

use crate::config::IndexerConfig;
use crate::download::{DownloadSummary, FilingDownloader};
use crate::error::Result;
use crate::feed::{FeedFetcher, ParsedFeed, parse_feed_file};
use crate::period::{Period, PeriodRange};
use crate::record::FilingRecord;
use crate::store::{FeedStore, FilingQuery, MergeMode, MergeSummary};
use tracing::{debug, info, warn};

/// What happened to one month of the range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodReport {
    /// Feed fetched and parsed
    Indexed {
        /// Month of the feed
        period: Period,
        /// Records parsed from the feed
        records: usize,
        /// Non-fatal warnings raised while parsing
        warnings: usize,
    },
    /// Feed could not be fetched or parsed; nothing from it was stored
    Skipped {
        /// Month of the feed
        period: Period,
        /// Why the month was skipped
        reason: String,
    },
}

impl PeriodReport {
    /// Month this report is about.
    pub const fn period(&self) -> Period {
        match self {
            Self::Indexed { period, .. } | Self::Skipped { period, .. } => *period,
        }
    }
}

/// Outcome of indexing a range of months.
#[derive(Debug, Clone, Default)]
pub struct IndexSummary {
    /// One report per month, in chronological order
    pub reports: Vec<PeriodReport>,
    /// Result of merging the parsed records into the store
    pub merge: MergeSummary,
}

impl IndexSummary {
    /// Months that were skipped.
    pub fn skipped(&self) -> impl Iterator<Item = &PeriodReport> {
        self.reports
            .iter()
            .filter(|r| matches!(r, PeriodReport::Skipped { .. }))
    }
}

/// Owns the working directory, the feed cache and the metadata store.
#[derive(Debug)]
pub struct SecIndexer {
    config: IndexerConfig,
    fetcher: FeedFetcher,
    downloader: FilingDownloader,
    store: FeedStore,
}

impl SecIndexer {
    /// Prepare the working directory and open the store.
    pub fn new(config: IndexerConfig) -> Result<Self> {
        config.work_dir.prepare()?;
        let store = FeedStore::open(config.work_dir.database())?;
        let fetcher = FeedFetcher::new(&config)?;
        let downloader = FilingDownloader::new(&config)?;

        debug!(work_dir = %config.work_dir.root().display(), "Opened indexer");
        Ok(Self {
            config,
            fetcher,
            downloader,
            store,
        })
    }

    /// Configuration this indexer was built with.
    pub const fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// The metadata store.
    pub const fn store(&self) -> &FeedStore {
        &self.store
    }

    /// Fetch (or reuse the cached) feed for `period` and parse it.
    pub async fn index_period(&self, period: Period) -> Result<ParsedFeed> {
        let path = self.fetcher.fetch(period).await?;
        parse_feed_file(&path)
    }

    /// Index every month of `range` and merge the results in one batch.
    ///
    /// Months whose feed cannot be fetched or parsed are skipped and reported;
    /// they never leave anything in the cache or the store.
    pub async fn download_sec_feeds(
        &self,
        range: PeriodRange,
        mode: MergeMode,
    ) -> Result<IndexSummary> {
        self.download_sec_feeds_with(range, mode, |_| {}).await
    }

    /// Like [`SecIndexer::download_sec_feeds`], calling `on_period` as each
    /// month completes.
    pub async fn download_sec_feeds_with<F>(
        &self,
        range: PeriodRange,
        mode: MergeMode,
        mut on_period: F,
    ) -> Result<IndexSummary>
    where
        F: FnMut(&PeriodReport),
    {
        info!(
            from = %range.first(),
            to = %range.last(),
            months = range.len(),
            "Indexing feeds"
        );

        let mut summary = IndexSummary::default();
        let mut record_sets: Vec<Vec<FilingRecord>> = Vec::with_capacity(range.len());

        for period in range {
            let report = match self.index_period(period).await {
                Ok(parsed) => {
                    let report = PeriodReport::Indexed {
                        period,
                        records: parsed.records.len(),
                        warnings: parsed.warnings.len(),
                    };
                    record_sets.push(parsed.records);
                    report
                }
                Err(e) => {
                    warn!(%period, error = %e, "Skipping feed");
                    PeriodReport::Skipped {
                        period,
                        reason: e.to_string(),
                    }
                }
            };
            on_period(&report);
            summary.reports.push(report);
        }

        summary.merge = self.store.merge(record_sets, mode)?;
        Ok(summary)
    }

    /// Download the instance documents of every filing matching `query`.
    pub async fn download_xbrl_data(&self, query: &FilingQuery) -> Result<DownloadSummary> {
        let urls = self.query(query)?;
        Ok(self.downloader.download_all(urls).await)
    }

    /// Instance document URLs matching `query`.
    pub fn query(&self, query: &FilingQuery) -> Result<Vec<String>> {
        debug!(
            cik = %query.cik,
            from_year = query.from_year,
            to_year = query.to_year,
            form = ?query.form,
            "Querying filings"
        );
        let urls = self.store.query(query)?;
        info!(cik = %query.cik, filings = urls.len(), "Found filings");
        Ok(urls)
    }

    /// The filing downloader.
    pub const fn downloader(&self) -> &FilingDownloader {
        &self.downloader
    }
}
