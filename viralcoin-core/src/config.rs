//! Engine configuration
//!
//! Every tunable the engine uses is supplied by the caller through
//! [`EngineConfig`]. The defaults reproduce the canonical tables; a TOML file
//! only needs to name the values it overrides.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::{
    Category, EngineError, BASE_MARKET_CAP, BASE_SUPPLY, DEFAULT_CACHE_TTL_SECS, LIQUIDITY_RATIO,
    MAX_CACHE_TTL_SECS,
};

/// Complete engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub extraction: ExtractionConfig,
    pub stop_words: Vec<String>,
    pub classifier: ClassifierConfig,
    pub tokenomics: TokenomicsConfig,
    /// Source cache expiry in seconds
    pub cache_ttl_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            stop_words: strings(&["the", "and", "that", "have", "for", "not", "with", "you", "this"]),
            classifier: ClassifierConfig::default(),
            tokenomics: TokenomicsConfig::default(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) TOML document
    pub fn from_toml_str(toml_str: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject tables that would produce an inconsistent token configuration
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(EngineError::InvalidConfig(format!(
                "cache_ttl_secs must be at most {}, got {}",
                MAX_CACHE_TTL_SECS, self.cache_ttl_secs
            )));
        }

        let x = &self.extraction;
        for (label, value) in [
            ("extraction.social_weight", x.social_weight),
            ("extraction.text_token_weight", x.text_token_weight),
            ("extraction.search_score_scale", x.search_score_scale),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    label, value
                )));
            }
        }

        let t = &self.tokenomics;
        if t.name_suffixes.is_empty() {
            return Err(EngineError::InvalidConfig(
                "tokenomics.name_suffixes must not be empty".to_string(),
            ));
        }
        if t.base_supply == 0 {
            return Err(EngineError::InvalidConfig(
                "tokenomics.base_supply must be positive".to_string(),
            ));
        }
        if !(t.base_market_cap.is_finite() && t.base_market_cap >= 0.0)
            || !(t.liquidity_ratio.is_finite() && t.liquidity_ratio >= 0.0)
        {
            return Err(EngineError::InvalidConfig(
                "market cap estimates must be non-negative".to_string(),
            ));
        }

        if let Some(field) = t.base.non_finite_field() {
            return Err(EngineError::InvalidConfig(format!(
                "tokenomics.base.{} must be a finite number",
                field
            )));
        }

        for category in Category::ALL {
            let profile = t.categories.get(category);
            let schedule = t.base.adjusted(profile);

            if let Some(field) = schedule.non_finite_field() {
                return Err(EngineError::InvalidConfig(format!(
                    "{}: adjusted {} must be a finite number",
                    category, field
                )));
            }

            if !(profile.supply_multiplier.is_finite() && profile.supply_multiplier > 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{}: supply multiplier must be positive",
                    category
                )));
            }
            if (t.base_supply as f64 * profile.supply_multiplier).floor() < 1.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{}: derived supply rounds down to zero",
                    category
                )));
            }
            if schedule.tax < 0.0 || schedule.liquidity < 0.0 || schedule.marketing < 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{}: fees must not be negative",
                    category
                )));
            }
            if schedule.total_fee() > 100.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{}: combined fee {}% exceeds 100%",
                    category,
                    schedule.total_fee()
                )));
            }
            if schedule.max_wallet <= 0.0 || schedule.max_transaction <= 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{}: wallet and transaction limits must be positive",
                    category
                )));
            }
            if !(schedule.swap_threshold > 0.0 && schedule.swap_threshold <= 100.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{}: swap threshold {}% is outside (0, 100]",
                    category, schedule.swap_threshold
                )));
            }
        }

        Ok(())
    }
}

/// Per-source keyword weighting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Multiplier on a social hashtag's raw score
    pub social_weight: f64,
    /// Weight of each qualifying token in a forum/news title
    pub text_token_weight: f64,
    /// Scale applied to a search-interest score (score / 10)
    pub search_score_scale: f64,
    /// Minimum length of a free-text token
    pub min_token_len: usize,
    /// Short tokens that count despite the length filter
    pub short_token_allowlist: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            social_weight: 3.0,
            text_token_weight: 2.0,
            search_score_scale: 0.1,
            min_token_len: 4,
            short_token_allowlist: Vec::new(),
        }
    }
}

/// Keyword tables for the category and archetype classifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Keyword sets per category, evaluated crypto → entertainment
    pub categories: CategoryKeywords,
    /// Topics shorter than this many characters fall back to meme / memecoin
    pub fallback_length: usize,
    /// Meme-culture terms for the archetype classifier
    pub memecoin_keywords: Vec<String>,
    /// Utility/DeFi terms for the archetype classifier
    pub utility_keywords: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            categories: CategoryKeywords::default(),
            fallback_length: 6,
            memecoin_keywords: strings(&[
                "meme", "doge", "shib", "moon", "elon", "pepe", "wojak", "chad", "inu", "cat",
                "safe", "food", "baby", "funny", "joke", "lol", "wow", "pump",
            ]),
            utility_keywords: strings(&[
                "defi", "swap", "chain", "finance", "exchange", "protocol", "dao", "governance",
                "stake", "yield", "farm", "nft", "metaverse", "game", "play", "earn", "web3",
                "ai", "smart",
            ]),
        }
    }
}

/// Keyword lists for the five matchable categories
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryKeywords {
    pub crypto: Vec<String>,
    pub meme: Vec<String>,
    pub tech: Vec<String>,
    pub finance: Vec<String>,
    pub entertainment: Vec<String>,
}

impl Default for CategoryKeywords {
    fn default() -> Self {
        Self {
            crypto: strings(&["bitcoin", "ethereum", "crypto", "blockchain", "nft", "defi", "web3"]),
            meme: strings(&["meme", "viral", "funny", "joke", "lol", "trending"]),
            tech: strings(&["ai", "artificial", "technology", "software", "hardware", "app", "digital"]),
            finance: strings(&["market", "stock", "invest", "trading", "finance", "economic"]),
            entertainment: strings(&[
                "movie", "music", "celebrity", "game", "play", "stream", "show", "actor", "song",
            ]),
        }
    }
}

impl CategoryKeywords {
    /// Categories paired with their keywords, in evaluation order
    pub fn ordered(&self) -> [(Category, &[String]); 5] {
        [
            (Category::Crypto, self.crypto.as_slice()),
            (Category::Meme, self.meme.as_slice()),
            (Category::Tech, self.tech.as_slice()),
            (Category::Finance, self.finance.as_slice()),
            (Category::Entertainment, self.entertainment.as_slice()),
        ]
    }
}

/// Base fee and limit values, all in percent units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub tax: f64,
    pub liquidity: f64,
    pub marketing: f64,
    pub max_wallet: f64,
    pub max_transaction: f64,
    pub swap_threshold: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            tax: 2.0,
            liquidity: 3.0,
            marketing: 2.0,
            max_wallet: 2.0,
            max_transaction: 1.0,
            swap_threshold: 0.1,
        }
    }
}

impl FeeSchedule {
    /// Apply a category's adjustments to this base schedule
    pub fn adjusted(&self, profile: &CategoryProfile) -> FeeSchedule {
        FeeSchedule {
            tax: self.tax + profile.tax,
            liquidity: self.liquidity + profile.liquidity,
            marketing: self.marketing + profile.marketing,
            max_wallet: self.max_wallet + profile.max_wallet,
            max_transaction: self.max_transaction + profile.max_transaction,
            swap_threshold: self.swap_threshold + profile.swap_threshold,
        }
    }

    pub fn total_fee(&self) -> f64 {
        self.tax + self.liquidity + self.marketing
    }

    /// First field holding NaN or an infinity
    fn non_finite_field(&self) -> Option<&'static str> {
        [
            ("tax", self.tax),
            ("liquidity", self.liquidity),
            ("marketing", self.marketing),
            ("max_wallet", self.max_wallet),
            ("max_transaction", self.max_transaction),
            ("swap_threshold", self.swap_threshold),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(field, _)| field)
    }
}

/// Supply multiplier and fee/limit adjustments for one category
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryProfile {
    pub supply_multiplier: f64,
    pub tax: f64,
    pub liquidity: f64,
    pub marketing: f64,
    pub max_wallet: f64,
    pub max_transaction: f64,
    pub swap_threshold: f64,
}

impl CategoryProfile {
    const fn new(
        supply_multiplier: f64,
        tax: f64,
        liquidity: f64,
        marketing: f64,
        max_wallet: f64,
        max_transaction: f64,
        swap_threshold: f64,
    ) -> Self {
        Self {
            supply_multiplier,
            tax,
            liquidity,
            marketing,
            max_wallet,
            max_transaction,
            swap_threshold,
        }
    }
}

/// One profile per category, so no category can be missing from the table.
///
/// Deserialized field by field over the canonical profiles: a TOML table
/// naming only `tax` keeps that category's other values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryProfiles {
    pub crypto: CategoryProfile,
    pub meme: CategoryProfile,
    pub tech: CategoryProfile,
    pub finance: CategoryProfile,
    pub entertainment: CategoryProfile,
    pub other: CategoryProfile,
}

impl CategoryProfiles {
    pub fn get(&self, category: Category) -> &CategoryProfile {
        match category {
            Category::Crypto => &self.crypto,
            Category::Meme => &self.meme,
            Category::Tech => &self.tech,
            Category::Finance => &self.finance,
            Category::Entertainment => &self.entertainment,
            Category::Other => &self.other,
        }
    }
}

impl Default for CategoryProfiles {
    fn default() -> Self {
        Self {
            crypto: CategoryProfile::new(0.1, 1.0, 1.0, 1.0, 0.0, 0.5, 0.05),
            meme: CategoryProfile::new(10.0, 2.0, 2.0, 3.0, -0.5, -0.25, 0.1),
            tech: CategoryProfile::new(0.5, 0.5, 0.0, 1.0, 1.0, 0.5, 0.02),
            finance: CategoryProfile::new(0.2, 0.0, -0.5, 0.5, 1.5, 0.75, 0.03),
            entertainment: CategoryProfile::new(5.0, 1.5, 1.5, 2.0, -0.75, -0.4, 0.08),
            other: CategoryProfile::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0),
        }
    }
}

/// Fields given for one category in a config file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ProfileOverride {
    supply_multiplier: Option<f64>,
    tax: Option<f64>,
    liquidity: Option<f64>,
    marketing: Option<f64>,
    max_wallet: Option<f64>,
    max_transaction: Option<f64>,
    swap_threshold: Option<f64>,
}

impl ProfileOverride {
    fn apply(self, base: CategoryProfile) -> CategoryProfile {
        CategoryProfile {
            supply_multiplier: self.supply_multiplier.unwrap_or(base.supply_multiplier),
            tax: self.tax.unwrap_or(base.tax),
            liquidity: self.liquidity.unwrap_or(base.liquidity),
            marketing: self.marketing.unwrap_or(base.marketing),
            max_wallet: self.max_wallet.unwrap_or(base.max_wallet),
            max_transaction: self.max_transaction.unwrap_or(base.max_transaction),
            swap_threshold: self.swap_threshold.unwrap_or(base.swap_threshold),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ProfileOverrides {
    crypto: ProfileOverride,
    meme: ProfileOverride,
    tech: ProfileOverride,
    finance: ProfileOverride,
    entertainment: ProfileOverride,
    other: ProfileOverride,
}

impl<'de> Deserialize<'de> for CategoryProfiles {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let overrides = ProfileOverrides::deserialize(deserializer)?;
        let canonical = CategoryProfiles::default();

        Ok(Self {
            crypto: overrides.crypto.apply(canonical.crypto),
            meme: overrides.meme.apply(canonical.meme),
            tech: overrides.tech.apply(canonical.tech),
            finance: overrides.finance.apply(canonical.finance),
            entertainment: overrides.entertainment.apply(canonical.entertainment),
            other: overrides.other.apply(canonical.other),
        })
    }
}

/// Token parameter derivation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenomicsConfig {
    pub base_supply: u64,
    pub base: FeeSchedule,
    pub categories: CategoryProfiles,
    /// Suffixes appended to names that are too short to stand alone
    pub name_suffixes: Vec<String>,
    /// Names shorter than this get a suffix
    pub min_name_len: usize,
    pub base_market_cap: f64,
    pub liquidity_ratio: f64,
}

impl Default for TokenomicsConfig {
    fn default() -> Self {
        Self {
            base_supply: BASE_SUPPLY,
            base: FeeSchedule::default(),
            categories: CategoryProfiles::default(),
            name_suffixes: strings(&["Coin", "Token", "Finance", "Cash", "Money"]),
            min_name_len: 5,
            base_market_cap: BASE_MARKET_CAP,
            liquidity_ratio: LIQUIDITY_RATIO,
        }
    }
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}
