//! Topic classification
//!
//! Two independent classifiers share the same shape (ordered keyword
//! containment, then a length fallback):
//! - [`Category`] selects supply and fee tables
//! - [`TokenArchetype`] labels a token as memecoin or utility

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ClassifierConfig, EngineError};

/// Semantic category of a trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Crypto,
    Meme,
    Tech,
    Finance,
    Entertainment,
    Other,
}

impl Category {
    /// The closed taxonomy, in classifier priority order
    pub const ALL: [Category; 6] = [
        Category::Crypto,
        Category::Meme,
        Category::Tech,
        Category::Finance,
        Category::Entertainment,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Crypto => "crypto",
            Category::Meme => "meme",
            Category::Tech => "tech",
            Category::Finance => "finance",
            Category::Entertainment => "entertainment",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| EngineError::UnknownCategory(s.to_string()))
    }
}

/// Binary token archetype, independent of [`Category`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenArchetype {
    Memecoin,
    Utility,
}

impl fmt::Display for TokenArchetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenArchetype::Memecoin => f.write_str("memecoin"),
            TokenArchetype::Utility => f.write_str("utility"),
        }
    }
}

/// Keyword-table classifier
#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classify a topic into exactly one category.
    ///
    /// Categories are tried in priority order and the first one with a keyword
    /// contained in the topic wins. Unmatched topics shorter than the fallback
    /// length are `Meme`, everything else is `Other`.
    pub fn classify(&self, topic: &str) -> Category {
        let normalized = topic.to_lowercase();

        for (category, keywords) in self.config.categories.ordered() {
            if contains_any(&normalized, keywords) {
                return category;
            }
        }

        if self.is_short(topic) {
            Category::Meme
        } else {
            Category::Other
        }
    }

    /// Classify a topic as memecoin or utility
    pub fn classify_token_archetype(&self, topic: &str) -> TokenArchetype {
        let normalized = topic.to_lowercase();

        if contains_any(&normalized, &self.config.memecoin_keywords) {
            return TokenArchetype::Memecoin;
        }
        if contains_any(&normalized, &self.config.utility_keywords) {
            return TokenArchetype::Utility;
        }

        if self.is_short(topic) {
            TokenArchetype::Memecoin
        } else {
            TokenArchetype::Utility
        }
    }

    fn is_short(&self, topic: &str) -> bool {
        topic.chars().count() < self.config.fallback_length
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| !k.is_empty() && text.contains(k.to_lowercase().as_str()))
}
