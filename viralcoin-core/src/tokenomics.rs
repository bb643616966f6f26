//! Token parameter derivation
//!
//! Turns a (topic, score, category) triple into a complete token
//! configuration. Derivation is pure except for the name suffix, which is
//! drawn through an injected [`Chooser`].

use chrono::{Duration, NaiveDate};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{Category, Classifier, EngineConfig, EngineError, TokenArchetype, TokenomicsConfig, LAUNCH_DELAY_DAYS};

/// Source of the one random choice in derivation
pub trait Chooser: Send + Sync {
    /// Pick one item, `None` only when `items` is empty
    fn choose<'a>(&self, items: &'a [String]) -> Option<&'a String>;
}

/// Thread-safe reference to a chooser
pub type SharedChooser = Arc<dyn Chooser>;

/// Uniform choice from the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomChooser;

impl Chooser for RandomChooser {
    fn choose<'a>(&self, items: &'a [String]) -> Option<&'a String> {
        items.choose(&mut rand::thread_rng())
    }
}

/// Reproducible choice from a seeded RNG
pub struct SeededChooser {
    rng: Mutex<StdRng>,
}

impl SeededChooser {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Chooser for SeededChooser {
    fn choose<'a>(&self, items: &'a [String]) -> Option<&'a String> {
        items.choose(&mut *self.rng.lock())
    }
}

/// Always picks the same index (wrapping), for tests
#[derive(Debug, Clone, Copy)]
pub struct FixedChooser(pub usize);

impl Chooser for FixedChooser {
    fn choose<'a>(&self, items: &'a [String]) -> Option<&'a String> {
        if items.is_empty() {
            None
        } else {
            items.get(self.0 % items.len())
        }
    }
}

/// Complete derived token parameter set.
///
/// Percentages are plain percent units (2.0 means 2%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenConfiguration {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub initial_supply: u64,
    pub tax_fee_percent: f64,
    pub liquidity_fee_percent: f64,
    pub marketing_fee_percent: f64,
    pub max_wallet_percent: f64,
    pub max_transaction_percent: f64,
    pub swap_threshold_percent: f64,
    pub estimated_market_cap: f64,
    pub estimated_initial_liquidity: f64,
}

impl TokenConfiguration {
    /// Combined transaction fee
    pub fn total_fee_percent(&self) -> f64 {
        self.tax_fee_percent + self.liquidity_fee_percent + self.marketing_fee_percent
    }
}

/// Token configuration plus the classification and launch metadata behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDetails {
    #[serde(flatten)]
    pub config: TokenConfiguration,
    pub category: Category,
    pub archetype: TokenArchetype,
    pub trend_score: f64,
    pub launch_date: NaiveDate,
}

/// Derives token configurations from the tokenomics tables
pub struct TokenDeriver {
    tokenomics: TokenomicsConfig,
    classifier: Classifier,
    chooser: SharedChooser,
}

impl TokenDeriver {
    pub fn new(config: &EngineConfig, chooser: SharedChooser) -> Self {
        Self {
            tokenomics: config.tokenomics.clone(),
            classifier: Classifier::new(config.classifier.clone()),
            chooser,
        }
    }

    /// Derive the full parameter set for a topic.
    ///
    /// Fails only on caller contract violations: a topic with no usable
    /// characters, or a negative or non-finite score.
    pub fn derive(
        &self,
        topic: &str,
        score: f64,
        category: Category,
    ) -> Result<TokenConfiguration, EngineError> {
        if !score.is_finite() || score < 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "score must be a non-negative number, got {}",
                score
            )));
        }

        let name = self.derive_name(topic)?;
        let symbol = derive_symbol(&name);

        let t = &self.tokenomics;
        let profile = t.categories.get(category);
        let schedule = t.base.adjusted(profile);

        let initial_supply = (t.base_supply as f64 * profile.supply_multiplier).floor() as u64;
        let estimated_market_cap = t.base_market_cap * (1.0 + score / 100.0);

        Ok(TokenConfiguration {
            name,
            symbol,
            description: format!("Token based on trending topic: {}", topic.trim()),
            initial_supply,
            tax_fee_percent: schedule.tax,
            liquidity_fee_percent: schedule.liquidity,
            marketing_fee_percent: schedule.marketing,
            max_wallet_percent: schedule.max_wallet,
            max_transaction_percent: schedule.max_transaction,
            swap_threshold_percent: schedule.swap_threshold,
            estimated_market_cap,
            estimated_initial_liquidity: estimated_market_cap * t.liquidity_ratio,
        })
    }

    /// Classify the topic, then derive its configuration with launch metadata
    pub fn details(
        &self,
        topic: &str,
        score: f64,
        as_of: NaiveDate,
    ) -> Result<TokenDetails, EngineError> {
        let category = self.classifier.classify(topic);
        let archetype = self.classifier.classify_token_archetype(topic);
        let config = self.derive(topic, score, category)?;

        Ok(TokenDetails {
            config,
            category,
            archetype,
            trend_score: score,
            launch_date: as_of + Duration::days(LAUNCH_DELAY_DAYS),
        })
    }

    /// Human-readable token name: cleaned, capitalized, suffixed when short
    pub fn derive_name(&self, topic: &str) -> Result<String, EngineError> {
        let cleaned: String = topic
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
            .collect();

        let capitalized = cleaned
            .split_whitespace()
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ");

        if capitalized.is_empty() {
            return Err(EngineError::InvalidInput(format!(
                "topic {:?} has no letters or digits",
                topic
            )));
        }

        if capitalized.len() < self.tokenomics.min_name_len {
            let suffix = self.chooser.choose(&self.tokenomics.name_suffixes).ok_or_else(|| {
                EngineError::InvalidConfig("tokenomics.name_suffixes must not be empty".to_string())
            })?;
            return Ok(format!("{} {}", capitalized, suffix));
        }

        Ok(capitalized)
    }
}

/// Ticker symbol for a derived name: 3-4 uppercase ASCII letters.
///
/// Uses the initials of the words when there are at least three, otherwise
/// the leading letters of the name, padded with `X` if the name has too few.
pub fn derive_symbol(name: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().find(|c| c.is_ascii_alphabetic()))
        .collect();

    let mut symbol: String = if initials.len() >= 3 {
        initials.chars().take(4).collect()
    } else {
        let mut words = name.split_whitespace();
        let first: String = words
            .next()
            .unwrap_or_default()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .take(4)
            .collect();

        if first.len() >= 3 {
            first
        } else {
            let rest = words.flat_map(|w| w.chars()).filter(|c| c.is_ascii_alphabetic());
            first.chars().chain(rest).take(4).collect()
        }
    };

    while symbol.len() < 3 {
        symbol.push('X');
    }

    symbol.to_ascii_uppercase()
}

/// First character uppercase, the rest lowercase
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}
