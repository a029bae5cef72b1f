//! Download of XBRL instance documents referenced by indexed filings.

use crate::config::IndexerConfig;
use crate::error::{EdgarError, Result};
use reqwest::Url;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Outcome of a batch of downloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    /// URLs attempted
    pub requested: usize,
    /// Files written, in request order
    pub downloaded: Vec<PathBuf>,
    /// URLs that could not be downloaded
    pub failed: usize,
}

/// Last path segment of a filing URL, used as the local filename.
///
/// # Example
/// ```
/// use edgar_rss::download::filing_filename;
///
/// let name = filing_filename(
///     "https://www.sec.gov/Archives/edgar/data/50863/000005086316000105/intc-20151226.xml",
/// );
/// assert_eq!(name.as_deref(), Some("intc-20151226.xml"));
/// ```
pub fn filing_filename(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.path_segments()?
        .next_back()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Fetches filings into the working directory's `filings/` folder.
#[derive(Debug)]
pub struct FilingDownloader {
    client: reqwest::Client,
    filings_dir: PathBuf,
}

impl FilingDownloader {
    /// Create a downloader from the indexer configuration.
    pub fn new(config: &IndexerConfig) -> Result<Self> {
        Ok(Self {
            client: config.http_client(config.download_timeout)?,
            filings_dir: config.work_dir.filings_dir(),
        })
    }

    /// Download one filing and return the path it was written to.
    pub async fn download(&self, url: &str) -> Result<PathBuf> {
        let filename = filing_filename(url)
            .ok_or_else(|| EdgarError::Parse(format!("Invalid filing URL: {url}")))?;
        let path = self.filings_dir.join(filename);

        debug!(%url, to = %path.display(), "Downloading filing");
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(EdgarError::Http(format!(
                "Failed to fetch filing {}: HTTP {}",
                url,
                response.status()
            )));
        }

        let body = response.bytes().await?;
        tokio::fs::create_dir_all(&self.filings_dir).await?;
        tokio::fs::write(&path, &body).await?;

        Ok(path)
    }

    /// Download every URL in turn. A failed URL is logged and counted; the
    /// remaining URLs are still attempted.
    pub async fn download_all<I, S>(&self, urls: I) -> DownloadSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.download_each(urls, |_, _| {}).await
    }

    /// Like [`FilingDownloader::download_all`], calling `on_each` after every
    /// attempt with the URL and its outcome.
    pub async fn download_each<I, S, F>(&self, urls: I, mut on_each: F) -> DownloadSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&str, &Result<PathBuf>),
    {
        let mut summary = DownloadSummary::default();

        for url in urls {
            let url = url.as_ref();
            summary.requested += 1;

            let result = self.download(url).await;
            match &result {
                Ok(path) => summary.downloaded.push(path.clone()),
                Err(e) => {
                    warn!(%url, error = %e, "Failed to download filing");
                    summary.failed += 1;
                }
            }
            on_each(url, &result);
        }

        info!(
            downloaded = summary.downloaded.len(),
            failed = summary.failed,
            dir = %self.filings_dir.display(),
            "Downloaded filings"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filing_filename() {
        assert_eq!(
            filing_filename("https://www.sec.gov/Archives/edgar/data/1/2/abc-20161231.xml")
                .as_deref(),
            Some("abc-20161231.xml")
        );
        assert_eq!(
            filing_filename("https://example.com/a/b.xml?x=1").as_deref(),
            Some("b.xml")
        );
        assert_eq!(filing_filename("https://example.com/dir/"), None);
        assert_eq!(filing_filename("not a url"), None);
    }

    #[tokio::test]
    async fn test_invalid_url_is_counted_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let config = IndexerConfig::with_work_dir(tmp.path());
        let downloader = FilingDownloader::new(&config).unwrap();

        let summary = downloader.download_all(["not a url", "ftp://"]).await;
        assert_eq!(summary.requested, 2);
        assert_eq!(summary.failed, 2);
        assert!(summary.downloaded.is_empty());
    }
}
