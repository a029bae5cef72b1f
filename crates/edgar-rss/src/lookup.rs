//! Ticker to CIK resolution via the EDGAR company browse endpoint.

use crate::config::IndexerConfig;
use crate::error::{EdgarError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::path::Path;
use tracing::debug;

/// Resolves ticker symbols to CIK numbers.
#[derive(Debug)]
pub struct CikResolver {
    client: reqwest::Client,
    lookup_url: String,
}

impl CikResolver {
    /// Create a resolver from the indexer configuration.
    pub fn new(config: &IndexerConfig) -> Result<Self> {
        Ok(Self {
            client: config.http_client(config.download_timeout)?,
            lookup_url: config.lookup_url.clone(),
        })
    }

    /// Look up the CIK of `ticker`.
    ///
    /// # Returns
    /// The CIK exactly as EDGAR reports it (zero-padded to 10 digits)
    ///
    /// # Errors
    /// Returns `EdgarError::InvalidSymbol` for a blank ticker,
    /// `EdgarError::Lookup` if the endpoint cannot be queried and
    /// `EdgarError::CikNotFound` if the response carries no CIK.
    pub async fn resolve(&self, ticker: &str) -> Result<String> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(EdgarError::InvalidSymbol("Empty ticker".to_string()));
        }

        let lookup_error = |reason: String| EdgarError::Lookup {
            ticker: ticker.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&self.lookup_url)
            .query(&[("CIK", ticker), ("action", "getcompany"), ("output", "xml")])
            .send()
            .await
            .map_err(|e| lookup_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(lookup_error(format!("HTTP {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| lookup_error(e.to_string()))?;

        let cik = parse_cik(&body)
            .map_err(|e| lookup_error(e.to_string()))?
            .ok_or_else(|| EdgarError::CikNotFound(ticker.to_string()))?;

        debug!(%ticker, %cik, "Resolved ticker");
        Ok(cik)
    }
}

/// Text of the first `CIK` element (any case) in a company lookup response.
pub fn parse_cik(xml: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = false;

    let mut in_cik = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                in_cik = e.local_name().as_ref().eq_ignore_ascii_case(b"cik");
            }
            Event::Text(t) if in_cik => {
                let text = t.unescape()?;
                let text = text.trim();
                if !text.is_empty() {
                    return Ok(Some(text.to_string()));
                }
            }
            Event::End(_) => in_cik = false,
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Read tickers from a file, one per line. Blank lines and lines starting
/// with `#` are skipped.
pub fn read_ticker_file(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cik() {
        let xml = r#"<?xml version="1.0" encoding="ISO-8859-1" ?>
<companyFilings>
<companyInfo>
<CIK>0000050863</CIK>
<SIC>3674</SIC>
<name>INTEL CORP</name>
</companyInfo>
</companyFilings>"#;
        assert_eq!(parse_cik(xml).unwrap().as_deref(), Some("0000050863"));
    }

    #[test]
    fn test_parse_cik_lowercase_tag() {
        assert_eq!(
            parse_cik("<info><cik> 320193 </cik></info>").unwrap().as_deref(),
            Some("320193")
        );
    }

    #[test]
    fn test_parse_cik_missing() {
        assert_eq!(parse_cik("<companyFilings></companyFilings>").unwrap(), None);
    }

    #[test]
    fn test_read_ticker_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tickers.txt");
        std::fs::write(&path, "intc\n\n# comment\n  aapl  \r\nmsft").unwrap();

        let tickers = read_ticker_file(&path).unwrap();
        assert_eq!(tickers, vec!["intc", "aapl", "msft"]);
    }

    #[tokio::test]
    async fn test_empty_ticker() {
        let resolver = CikResolver::new(&IndexerConfig::default()).unwrap();
        let result = resolver.resolve("  ").await;
        assert!(matches!(result, Err(EdgarError::InvalidSymbol(_))));
    }
}
