//! Working-directory layout and HTTP client configuration.

use crate::error::{EdgarError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default working directory, relative to where the tool runs.
pub const DEFAULT_WORK_DIR: &str = "./edgar";

/// Base URL under which EDGAR publishes the monthly XBRL feeds.
pub const DEFAULT_BASE_URL: &str = "https://www.sec.gov/Archives/edgar";

/// Company lookup endpoint used to resolve tickers to CIKs.
pub const DEFAULT_LOOKUP_URL: &str = "https://www.sec.gov/cgi-bin/browse-edgar";

/// User agent for SEC EDGAR requests (SEC requires identifying information)
pub const DEFAULT_USER_AGENT: &str = "edgar-rss/0.1 (contact@example.com)";

/// Timeout applied to every outbound request unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DATABASE_FILE: &str = "edgar.db";
const FEED_DIR: &str = "rss-archives";
const FILINGS_DIR: &str = "filings";

/// Layout of the working directory: the metadata database, the feed cache
/// and the downloaded filings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    /// Layout rooted at `root`. Nothing is created until [`WorkDir::prepare`].
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root of the working directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the SQLite metadata database.
    pub fn database(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }

    /// Directory holding cached monthly feeds.
    pub fn feed_dir(&self) -> PathBuf {
        self.root.join(FEED_DIR)
    }

    /// Directory holding downloaded filings.
    pub fn filings_dir(&self) -> PathBuf {
        self.root.join(FILINGS_DIR)
    }

    /// Create the feed and filings directories if they are missing.
    pub fn prepare(&self) -> Result<()> {
        for dir in [self.feed_dir(), self.filings_dir()] {
            if !dir.is_dir() {
                std::fs::create_dir_all(&dir)?;
                debug!(dir = %dir.display(), "Created directory");
            }
        }
        Ok(())
    }
}

impl Default for WorkDir {
    fn default() -> Self {
        Self::new(DEFAULT_WORK_DIR)
    }
}

/// Configuration shared by the fetcher, downloader and resolver.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Working directory layout
    pub work_dir: WorkDir,
    /// Base URL of the EDGAR archives; feeds live under `<base>/monthly/`
    pub base_url: String,
    /// Ticker lookup endpoint
    pub lookup_url: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// Timeout for monthly feed downloads
    pub feed_timeout: Duration,
    /// Timeout for filing downloads and ticker lookups
    pub download_timeout: Duration,
}

impl IndexerConfig {
    /// Default configuration rooted at `work_dir`.
    pub fn with_work_dir<P: AsRef<Path>>(work_dir: P) -> Self {
        Self {
            work_dir: WorkDir::new(work_dir),
            ..Self::default()
        }
    }

    /// Build an HTTP client carrying the configured user agent and timeout.
    pub(crate) fn http_client(&self, timeout: Duration) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(timeout)
            .build()
            .map_err(EdgarError::Network)
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            work_dir: WorkDir::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            feed_timeout: DEFAULT_TIMEOUT,
            download_timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_dir_layout() {
        let wd = WorkDir::new("/tmp/edgar");
        assert_eq!(wd.database(), PathBuf::from("/tmp/edgar/edgar.db"));
        assert_eq!(wd.feed_dir(), PathBuf::from("/tmp/edgar/rss-archives"));
        assert_eq!(wd.filings_dir(), PathBuf::from("/tmp/edgar/filings"));
    }

    #[test]
    fn test_prepare_creates_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let wd = WorkDir::new(tmp.path().join("nested"));
        wd.prepare().unwrap();
        assert!(wd.feed_dir().is_dir());
        assert!(wd.filings_dir().is_dir());

        // Second call is a no-op
        wd.prepare().unwrap();
    }

    #[test]
    fn test_default_config() {
        let config = IndexerConfig::with_work_dir("somewhere");
        assert_eq!(config.work_dir.root(), Path::new("somewhere"));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.feed_timeout, DEFAULT_TIMEOUT);
    }
}
