//! Keyword extraction from normalized trend records
//!
//! Each source contributes keywords differently:
//! - Social: the whole hashtag, marker stripped, weighted by raw score
//! - Forum/News: alphabetic tokens from the title, fixed weight per occurrence
//! - Search: the whole term, weighted by its 0-100 interest score

use regex::Regex;
use std::sync::LazyLock;

use crate::{ExtractionConfig, SourceId, TrendRecord};

static WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[a-z]+\b").unwrap());

/// A single weighted keyword contribution
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordWeight {
    pub keyword: String,
    pub weight: f64,
}

impl KeywordWeight {
    fn new(keyword: String, weight: f64) -> Self {
        Self { keyword, weight }
    }
}

/// Turns trend records into weighted keyword contributions
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    config: ExtractionConfig,
}

impl KeywordExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Extract keyword contributions from one record.
    ///
    /// Duplicates are kept; accumulation happens in the aggregator.
    pub fn extract(&self, record: &TrendRecord) -> Vec<KeywordWeight> {
        match record.source {
            SourceId::Social => {
                let keyword = normalize_topic(&record.name);
                if keyword.is_empty() {
                    return Vec::new();
                }
                vec![KeywordWeight::new(keyword, record.raw_score * self.config.social_weight)]
            }
            SourceId::Forum | SourceId::News => self
                .tokenize(&record.name)
                .into_iter()
                .map(|token| KeywordWeight::new(token, self.config.text_token_weight))
                .collect(),
            SourceId::Search => {
                let keyword = record.name.trim().to_lowercase();
                if keyword.is_empty() {
                    return Vec::new();
                }
                vec![KeywordWeight::new(keyword, record.raw_score * self.config.search_score_scale)]
            }
        }
    }

    /// Extract contributions from every record, in input order
    pub fn extract_all<'a, I>(&self, records: I) -> Vec<KeywordWeight>
    where
        I: IntoIterator<Item = &'a TrendRecord>,
    {
        records.into_iter().flat_map(|r| self.extract(r)).collect()
    }

    /// Split free text into qualifying lowercase tokens.
    ///
    /// Tokens shorter than `min_token_len` are dropped unless allow-listed, so
    /// with the default configuration two-letter terms such as "ai" never count.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        WORD_REGEX
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|token| {
                token.len() >= self.config.min_token_len
                    || self.config.short_token_allowlist.iter().any(|a| a == token)
            })
            .map(|token| token.to_string())
            .collect()
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

/// Normalize a hashtag-style topic: drop `#` markers, trim, lowercase
pub fn normalize_topic(topic: &str) -> String {
    topic.replace('#', "").trim().to_lowercase()
}
