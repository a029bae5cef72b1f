//! Error types for feed indexing and filing downloads.

use crate::period::Period;
use thiserror::Error;

/// Result type for EDGAR operations.
pub type Result<T> = std::result::Result<T, EdgarError>;

/// Errors that can occur while indexing feeds or downloading filings.
#[derive(Debug, Error)]
pub enum EdgarError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// HTTP error (non-success status)
    #[error("HTTP error: {0}")]
    Http(String),

    /// A monthly feed could not be fetched. Nothing was written to the cache,
    /// so the period can be retried.
    #[error("Failed to fetch feed for {period}: {reason}")]
    FeedFetch {
        /// Period whose feed was requested
        period: Period,
        /// Why the fetch failed
        reason: String,
    },

    /// Invalid ticker or identifier
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// CIK not found for ticker
    #[error("CIK not found for ticker: {0}")]
    CikNotFound(String),

    /// The CIK lookup endpoint could not be queried
    #[error("CIK lookup failed for {ticker}: {reason}")]
    Lookup {
        /// Ticker that was being resolved
        ticker: String,
        /// Why the lookup failed
        reason: String,
    },

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),
}

impl EdgarError {
    /// Returns true if the error came from resolving a ticker to a CIK.
    pub const fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            Self::CikNotFound(_) | Self::InvalidSymbol(_) | Self::Lookup { .. }
        )
    }

    /// Returns true if the error came from the metadata database.
    pub const fn is_database_failure(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

impl From<quick_xml::Error> for EdgarError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for EdgarError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::XmlParse(err.to_string())
    }
}
