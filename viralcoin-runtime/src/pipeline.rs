//! Trend pipeline
//!
//! Owns the registered sources and the engine components built from one
//! [`EngineConfig`]:
//! - `collect` fans out to every source at once and never fails
//! - `analyze` turns collected records into a [`TrendReport`]
//! - `suggest_token` derives token details for a topic or the top trend

use chrono::NaiveDate;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use viralcoin_core::{
    categorize, rank_scores, Aggregator, Classifier, EngineConfig, EngineError, RankedKeyword,
    SharedChooser, TokenDeriver, TokenDetails, TrendRecord,
};
use viralcoin_sources::{
    CachedSource, MemoryCache, MockSource, SharedSource, SourceAdapter, SourceError, TrendCache,
};

use crate::{FetchStatus, SourceBatch, TrendReport};

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("No trends available to suggest a token from")]
    NoTrends,
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Engine tables and weights
    pub engine: EngineConfig,
    /// Per-source fetch timeout in seconds
    pub fetch_timeout_secs: u64,
    /// Records requested from each source
    pub per_source_limit: usize,
    /// Keywords scoring below this are left out of reports
    pub min_score: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            fetch_timeout_secs: 10,
            per_source_limit: 10,
            min_score: 0.0,
        }
    }
}

impl PipelineConfig {
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.per_source_limit = limit;
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }
}

/// Trend collection and token suggestion pipeline
pub struct Pipeline {
    config: PipelineConfig,
    aggregator: Aggregator,
    classifier: Classifier,
    deriver: TokenDeriver,
    cache: Arc<dyn TrendCache>,
    sources: Vec<SharedSource>,
}

impl Pipeline {
    /// Create a pipeline with no sources; the engine config is validated
    pub fn new(config: PipelineConfig, chooser: SharedChooser) -> Result<Self, PipelineError> {
        config.engine.validate()?;

        Ok(Self {
            aggregator: Aggregator::new(&config.engine),
            classifier: Classifier::new(config.engine.classifier.clone()),
            deriver: TokenDeriver::new(&config.engine, chooser),
            cache: Arc::new(MemoryCache::new()),
            sources: Vec::new(),
            config,
        })
    }

    pub fn add_source(&mut self, source: SharedSource) {
        info!("Registered source {} ({})", source.name(), source.source());
        self.sources.push(source);
    }

    pub fn with_source<A: SourceAdapter + 'static>(mut self, source: A) -> Self {
        self.add_source(Arc::new(source));
        self
    }

    /// Register a source behind the pipeline's cache, expiring after
    /// the engine's `cache_ttl_secs`.
    ///
    /// Entries are scoped to this registration, so adapters sharing a name
    /// never see each other's records.
    pub fn with_cached_source<A: SourceAdapter + 'static>(self, source: A) -> Self {
        let ttl = Duration::from_secs(self.config.engine.cache_ttl_secs);
        let scope = format!("{}#{}", source.name(), self.sources.len());
        let cached = CachedSource::new(source, Arc::clone(&self.cache), ttl).with_scope(&scope);
        self.with_source(cached)
    }

    /// Register the four mock sources
    pub fn with_mock_sources(self) -> Self {
        MockSource::all()
            .into_iter()
            .fold(self, |pipeline, source| pipeline.with_cached_source(source))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Fetch every source concurrently.
    ///
    /// A source that errors or exceeds the timeout yields an empty batch
    /// with its status recorded; the other sources are unaffected.
    pub async fn collect(&self) -> Vec<SourceBatch> {
        let timeout_secs = self.config.fetch_timeout_secs;
        let timeout = Duration::from_secs(timeout_secs);
        let limit = self.config.per_source_limit;

        let fetches = self.sources.iter().map(|source| async move {
            let started = Instant::now();

            let result = match tokio::time::timeout(timeout, source.fetch(limit)).await {
                Ok(result) => result,
                Err(_) => Err(SourceError::Timeout(timeout_secs)),
            };

            let (records, status) = match result {
                Ok(records) => (records, FetchStatus::Ok),
                Err(SourceError::Timeout(secs)) => {
                    warn!("Source {} timed out after {}s", source.name(), secs);
                    (Vec::new(), FetchStatus::TimedOut)
                }
                Err(e) => {
                    warn!("Source {} failed: {}", source.name(), e);
                    (Vec::new(), FetchStatus::Failed(e.to_string()))
                }
            };

            let elapsed_ms = started.elapsed().as_millis() as u64;
            debug!("Source {} returned {} records in {}ms", source.name(), records.len(), elapsed_ms);

            SourceBatch {
                adapter: source.name().to_string(),
                source: source.source(),
                records,
                status,
                elapsed_ms,
            }
        });

        join_all(fetches).await
    }

    /// Collect all sources and build a report of the top `limit` keywords
    pub async fn analyze(&self, limit: usize) -> TrendReport {
        let batches = self.collect().await;
        self.report(&batches, limit)
    }

    /// Build a report from already collected batches
    pub fn report(&self, batches: &[SourceBatch], limit: usize) -> TrendReport {
        let records = flatten(batches);
        let qualifying = self.qualifying(&records);

        let mut categorized = categorize(&qualifying, &self.classifier);
        for entries in categorized.values_mut() {
            entries.truncate(limit);
        }

        let mut top = qualifying;
        top.truncate(limit);

        info!(
            "Analyzed {} records from {} sources, {} top keywords",
            records.len(),
            batches.len(),
            top.len()
        );

        TrendReport::new(top, categorized, batches.iter().map(SourceBatch::summary).collect())
    }

    /// Aggregate score of one topic across all sources, zero when unseen
    pub async fn score_topic(&self, topic: &str) -> f64 {
        let records = flatten(&self.collect().await);
        self.aggregator.score_topic(&records, topic)
    }

    /// Derive token details for `topic`, or for the top trend when `None`
    pub async fn suggest_token(
        &self,
        topic: Option<&str>,
        as_of: NaiveDate,
    ) -> Result<TokenDetails, PipelineError> {
        let records = flatten(&self.collect().await);

        let (topic, score) = match topic {
            Some(topic) => (topic.to_string(), self.aggregator.score_topic(&records, topic)),
            None => {
                let top = self
                    .qualifying(&records)
                    .into_iter()
                    .next()
                    .ok_or(PipelineError::NoTrends)?;
                (top.keyword, top.score)
            }
        };

        let details = self.deriver.details(&topic, score, as_of)?;
        info!(
            "Suggested {} ({}) for '{}' [{}], score {:.2}",
            details.config.name, details.config.symbol, topic, details.category, score
        );
        Ok(details)
    }

    /// Ranked keywords at or above the minimum score
    fn qualifying(&self, records: &[TrendRecord]) -> Vec<RankedKeyword> {
        let scores = self.aggregator.aggregate(records);
        rank_scores(&scores, scores.len())
            .into_iter()
            .filter(|entry| entry.score >= self.config.min_score)
            .collect()
    }
}

fn flatten(batches: &[SourceBatch]) -> Vec<TrendRecord> {
    batches.iter().flat_map(|b| b.records.iter().cloned()).collect()
}
