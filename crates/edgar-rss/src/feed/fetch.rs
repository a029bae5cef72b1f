//! Download and local caching of the monthly XBRL feeds.

use crate::config::IndexerConfig;
use crate::error::{EdgarError, Result};
use crate::period::Period;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Filename of the feed for `period`, e.g. `xbrlrss-2016-12.xml`.
pub fn feed_filename(period: Period) -> String {
    format!("xbrlrss-{}-{:02}.xml", period.year, period.month)
}

/// Fetches monthly feeds into a local cache directory.
///
/// A cached feed is never re-fetched. A failed download leaves the cache
/// untouched so the period can be retried later.
#[derive(Debug)]
pub struct FeedFetcher {
    client: reqwest::Client,
    base_url: String,
    feed_dir: PathBuf,
}

impl FeedFetcher {
    /// Create a fetcher from the indexer configuration.
    pub fn new(config: &IndexerConfig) -> Result<Self> {
        Ok(Self {
            client: config.http_client(config.feed_timeout)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            feed_dir: config.work_dir.feed_dir(),
        })
    }

    /// Remote URL of the feed for `period`.
    pub fn feed_url(&self, period: Period) -> String {
        format!("{}/monthly/{}", self.base_url, feed_filename(period))
    }

    /// Local cache path of the feed for `period`.
    pub fn feed_path(&self, period: Period) -> PathBuf {
        self.feed_dir.join(feed_filename(period))
    }

    /// Return the local path of the feed for `period`, downloading it first
    /// if it is not cached.
    ///
    /// # Errors
    /// Returns [`EdgarError::FeedFetch`] if the request fails or the server
    /// answers with a non-success status. No file is written in that case.
    pub async fn fetch(&self, period: Period) -> Result<PathBuf> {
        let path = self.feed_path(period);

        if path.exists() {
            debug!(feed = %path.display(), "Skipping download: feed already cached");
            return Ok(path);
        }

        let url = self.feed_url(period);
        debug!(%url, "Fetching feed");

        let body = self
            .download(&url)
            .await
            .map_err(|reason| EdgarError::FeedFetch { period, reason })?;

        write_atomically(&path, &body).await?;
        info!(feed = %path.display(), bytes = body.len(), "Downloaded feed");

        Ok(path)
    }

    async fn download(&self, url: &str) -> std::result::Result<Vec<u8>, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }

        let body = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(body.to_vec())
    }
}

/// Write `contents` next to `path` and rename it into place, so a partial
/// write never shows up as a cached feed.
async fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    tokio::fs::write(&partial, contents).await?;
    if let Err(e) = tokio::fs::rename(&partial, path).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e.into());
    }
    Ok(())
}
