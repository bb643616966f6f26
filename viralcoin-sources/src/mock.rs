//! Offline adapters with sample platform data

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use viralcoin_core::{SourceId, TrendRecord};

use crate::{SourceAdapter, SourceError};

const SOCIAL_HASHTAGS: &[(&str, u64)] = &[
    ("#AI", 42000),
    ("#Crypto", 38000),
    ("#NFTs", 35000),
    ("#Web3", 30000),
    ("#DeFi", 25000),
    ("#Blockchain", 22000),
    ("#Metaverse", 20000),
    ("#GameFi", 18000),
    ("#DAO", 15000),
    ("#SmartContracts", 12000),
];

const FORUM_POSTS: &[(&str, f64)] = &[
    ("New breakthrough in quantum computing", 15000.0),
    ("Latest crypto market analysis", 12000.0),
    ("New AI model generates realistic images", 10000.0),
    ("Decentralized finance gaining momentum", 8000.0),
    ("Top NFT collections this week", 7500.0),
    ("Smart contract security best practices", 7000.0),
    ("Blockchain use cases beyond crypto", 6500.0),
    ("Web3 development tools roundup", 6000.0),
    ("Metaverse property investments surge", 5500.0),
    ("DAO governance models compared", 5000.0),
];

const NEWS_HEADLINES: &[&str] = &[
    "New breakthrough in quantum computing",
    "Latest crypto market analysis",
    "New AI model generates realistic images",
    "Decentralized finance gaining momentum",
    "Top NFT collections this week",
    "Smart contract security best practices",
    "Blockchain use cases beyond crypto",
    "Web3 development tools roundup",
    "Metaverse property investments surge",
    "DAO governance models compared",
];

const SEARCH_TERMS: &[(&str, f64)] = &[
    ("cryptocurrency", 100.0),
    ("NFT", 85.0),
    ("blockchain", 75.0),
    ("web3", 65.0),
    ("metaverse", 60.0),
    ("defi projects", 55.0),
    ("crypto wallet", 50.0),
    ("dao governance", 45.0),
    ("smart contracts", 40.0),
    ("tokenomics", 35.0),
];

/// Built-in sample records for one source
pub fn sample_records(source: SourceId) -> Vec<TrendRecord> {
    match source {
        SourceId::Social => SOCIAL_HASHTAGS
            .iter()
            .map(|(tag, volume)| TrendRecord::new(source, tag, 1.0).with_volume(*volume))
            .collect(),
        SourceId::Forum => FORUM_POSTS
            .iter()
            .map(|(title, score)| TrendRecord::new(source, title, *score))
            .collect(),
        SourceId::News => NEWS_HEADLINES
            .iter()
            .map(|title| TrendRecord::new(source, title, 1.0))
            .collect(),
        SourceId::Search => SEARCH_TERMS
            .iter()
            .map(|(term, score)| TrendRecord::new(source, term, *score))
            .collect(),
    }
}

/// Adapter serving a fixed record set, for offline runs and tests
pub struct MockSource {
    source: SourceId,
    name: String,
    records: Vec<TrendRecord>,
    delay: Option<Duration>,
    failure: Option<String>,
    fetches: AtomicUsize,
}

impl MockSource {
    /// Mock adapter with the built-in sample data
    pub fn new(source: SourceId) -> Self {
        Self::with_records(source, sample_records(source))
    }

    /// Mock adapter with custom records
    pub fn with_records(source: SourceId, records: Vec<TrendRecord>) -> Self {
        Self {
            source,
            name: format!("mock-{}", source),
            records,
            delay: None,
            failure: None,
            fetches: AtomicUsize::new(0),
        }
    }

    /// All four mock sources in canonical order
    pub fn all() -> Vec<MockSource> {
        SourceId::ALL.into_iter().map(MockSource::new).collect()
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every fetch with the given reason
    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Number of fetches started so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAdapter for MockSource {
    fn source(&self) -> SourceId {
        self.source
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<TrendRecord>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(reason) = &self.failure {
            return Err(SourceError::Unavailable(reason.clone()));
        }

        Ok(self.records.iter().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_records_per_source() {
        for source in SourceId::ALL {
            let records = sample_records(source);
            assert_eq!(records.len(), 10);
            assert!(records.iter().all(|r| r.source == source));
        }

        let social = sample_records(SourceId::Social);
        assert_eq!(social[0].name, "#AI");
        assert_eq!(social[0].volume, Some(42000));
        assert_eq!(social[0].raw_score, 1.0);

        let search = sample_records(SourceId::Search);
        assert_eq!(search[0].raw_score, 100.0);
    }

    #[tokio::test]
    async fn test_fetch_respects_limit() {
        let source = MockSource::new(SourceId::Forum);
        let records = source.fetch(3).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "New breakthrough in quantum computing");
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_source() {
        let source = MockSource::new(SourceId::News).failing("rate limited");
        let err = source.fetch(10).await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(reason) if reason == "rate limited"));
    }

    #[test]
    fn test_all_sources() {
        let sources = MockSource::all();
        let ids: Vec<_> = sources.iter().map(|s| s.source()).collect();
        assert_eq!(ids, SourceId::ALL.to_vec());
        assert_eq!(sources[2].name(), "mock-search");
    }
}
