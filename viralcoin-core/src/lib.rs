//! ViralCoin Core - Trend aggregation and token-configuration engine
//!
//! This crate provides the pure, synchronous primitives:
//! - Trend records from weighted sources (social, forum, search, news)
//! - Keyword extraction and cross-source aggregation
//! - Category and token-archetype classification
//! - Deterministic tokenomics derivation
//! - Caller-supplied engine configuration

pub mod trends;
pub mod keywords;
pub mod aggregate;
pub mod classify;
pub mod tokenomics;
pub mod config;
pub mod error;

pub use trends::*;
pub use keywords::*;
pub use aggregate::*;
pub use classify::*;
pub use tokenomics::*;
pub use config::*;
pub use error::*;

/// Default source cache TTL in seconds (one hour)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Longest accepted source cache TTL in seconds (one year)
pub const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 3600;

/// Base token supply before the category multiplier is applied
pub const BASE_SUPPLY: u64 = 1_000_000_000;

/// Base market cap estimate in USD
pub const BASE_MARKET_CAP: f64 = 1_000_000.0;

/// Share of the market cap seeded as initial liquidity
pub const LIQUIDITY_RATIO: f64 = 0.2;

/// Days between suggestion and planned launch
pub const LAUNCH_DELAY_DAYS: i64 = 7;
