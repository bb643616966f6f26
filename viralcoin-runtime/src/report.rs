//! Collection results and analysis reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use viralcoin_core::{Category, RankedKeyword, SourceId, TrendRecord};

/// Outcome of fetching one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    Failed(String),
    TimedOut,
}

impl FetchStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, FetchStatus::Ok)
    }
}

/// Records fetched from one adapter in one collection run
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub adapter: String,
    pub source: SourceId,
    pub records: Vec<TrendRecord>,
    pub status: FetchStatus,
    pub elapsed_ms: u64,
}

impl SourceBatch {
    pub fn summary(&self) -> SourceSummary {
        SourceSummary {
            adapter: self.adapter.clone(),
            source: self.source,
            records: self.records.len(),
            status: self.status.clone(),
            elapsed_ms: self.elapsed_ms,
        }
    }
}

/// Per-source line of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub adapter: String,
    pub source: SourceId,
    pub records: usize,
    pub status: FetchStatus,
    pub elapsed_ms: u64,
}

/// Result of one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Highest-scoring keywords, best first
    pub top: Vec<RankedKeyword>,
    /// Qualifying keywords grouped by category, every category present
    pub categorized: BTreeMap<Category, Vec<RankedKeyword>>,
    pub sources: Vec<SourceSummary>,
}

impl TrendReport {
    pub fn new(
        top: Vec<RankedKeyword>,
        categorized: BTreeMap<Category, Vec<RankedKeyword>>,
        sources: Vec<SourceSummary>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            top,
            categorized,
            sources,
        }
    }

    /// Sources that answered successfully
    pub fn healthy_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.status.is_ok()).count()
    }

    /// Total records that went into the aggregation
    pub fn total_records(&self) -> usize {
        self.sources.iter().map(|s| s.records).sum()
    }

    /// Render as markdown for terminal output
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("# Trend Report\n\n");
        md.push_str(&format!(
            "_Generated {} from {} records ({}/{} sources healthy)_\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.total_records(),
            self.healthy_sources(),
            self.sources.len()
        ));

        md.push_str("## Top Trends\n\n");
        if self.top.is_empty() {
            md.push_str("No trends found.\n");
        }
        for (i, entry) in self.top.iter().enumerate() {
            md.push_str(&format!("{}. **{}** ({:.2})\n", i + 1, entry.keyword, entry.score));
        }

        md.push_str("\n## By Category\n\n");
        for (category, entries) in &self.categorized {
            if entries.is_empty() {
                continue;
            }
            let keywords: Vec<_> = entries.iter().map(|e| e.keyword.as_str()).collect();
            md.push_str(&format!("- **{}**: {}\n", category, keywords.join(", ")));
        }

        md.push_str("\n## Sources\n\n");
        for source in &self.sources {
            let status = match &source.status {
                FetchStatus::Ok => "ok".to_string(),
                FetchStatus::Failed(reason) => format!("failed: {}", reason),
                FetchStatus::TimedOut => "timed out".to_string(),
            };
            md.push_str(&format!(
                "- {} ({}): {} records in {}ms, {}\n",
                source.adapter, source.source, source.records, source.elapsed_ms, status
            ));
        }

        md
    }
}
