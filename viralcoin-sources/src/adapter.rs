//! Common interface for trend sources

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use viralcoin_core::{SourceId, TrendRecord};

/// Errors from fetching or parsing a source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// A platform that yields normalized trend records
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Which weighting family the records belong to
    fn source(&self) -> SourceId;

    /// Display name for logs and reports
    fn name(&self) -> &str {
        self.source().as_str()
    }

    /// Fetch at most `limit` records
    async fn fetch(&self, limit: usize) -> Result<Vec<TrendRecord>, SourceError>;
}

/// Thread-safe reference to an adapter
pub type SharedSource = Arc<dyn SourceAdapter>;

#[async_trait]
impl<T: SourceAdapter + ?Sized> SourceAdapter for Arc<T> {
    fn source(&self) -> SourceId {
        (**self).source()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<TrendRecord>, SourceError> {
        (**self).fetch(limit).await
    }
}
