//! Trend records normalized from platform-specific sources
//!
//! Every source adapter produces the same shape:
//! - A topic name (hashtag, post title, headline or search term)
//! - The source it came from
//! - A source-provided raw score, plus optional volume and description

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::EngineError;

/// Trend sources known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Hashtag feed (Twitter-like)
    Social,
    /// Forum post titles (Reddit-like)
    Forum,
    /// Search-interest terms with a 0-100 popularity score
    Search,
    /// News headlines
    News,
}

impl SourceId {
    /// All sources, in canonical order
    pub const ALL: [SourceId; 4] = [
        SourceId::Social,
        SourceId::Forum,
        SourceId::Search,
        SourceId::News,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Social => "social",
            SourceId::Forum => "forum",
            SourceId::Search => "search",
            SourceId::News => "news",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "social" | "twitter" => Ok(SourceId::Social),
            "forum" | "reddit" => Ok(SourceId::Forum),
            "search" | "google" | "google_trends" => Ok(SourceId::Search),
            "news" => Ok(SourceId::News),
            other => Err(EngineError::UnknownSource(other.to_string())),
        }
    }
}

/// A single trend observation from one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRecord {
    /// Topic as reported by the source
    pub name: String,
    /// Originating source
    pub source: SourceId,
    /// Source-provided popularity score
    pub raw_score: f64,
    /// Mention/post volume, if the source reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    /// Free-form description, if the source reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TrendRecord {
    pub fn new(source: SourceId, name: &str, raw_score: f64) -> Self {
        Self {
            name: name.to_string(),
            source,
            raw_score,
            volume: None,
            description: None,
        }
    }

    pub fn with_volume(mut self, volume: u64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Searchable text used for cross-platform presence detection
    pub fn text(&self) -> String {
        match &self.description {
            Some(description) => format!("{} {}", self.name, description),
            None => self.name.clone(),
        }
    }
}
