//! Cross-source aggregation
//!
//! Merges keyword contributions from every source into one score per keyword:
//! 1. Sum contributions per keyword
//! 2. Drop stop words
//! 3. Boost by how many sources mention the keyword anywhere in their text
//! 4. Rank by score, ties broken by keyword

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::{normalize_topic, Category, Classifier, EngineConfig, KeywordExtractor, SourceId, TrendRecord};

/// Final keyword → score mapping for one aggregation run
pub type KeywordScore = BTreeMap<String, f64>;

/// A keyword with its aggregate score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedKeyword {
    pub keyword: String,
    pub score: f64,
}

/// Combines weighted keyword streams from all sources
#[derive(Debug, Clone)]
pub struct Aggregator {
    extractor: KeywordExtractor,
    stop_words: Vec<String>,
}

impl Aggregator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            extractor: KeywordExtractor::new(config.extraction.clone()),
            stop_words: config.stop_words.clone(),
        }
    }

    /// Compute the final score of every keyword.
    ///
    /// The result does not depend on the order of `records`.
    pub fn aggregate(&self, records: &[TrendRecord]) -> KeywordScore {
        let mut contributions: HashMap<String, Vec<f64>> = HashMap::new();
        for contribution in self.extractor.extract_all(records) {
            contributions
                .entry(contribution.keyword)
                .or_default()
                .push(contribution.weight);
        }

        let source_texts = source_texts(records);
        let total_sources = SourceId::ALL.len() as f64;

        contributions
            .into_iter()
            .filter(|(keyword, _)| !self.is_stop_word(keyword))
            .map(|(keyword, mut weights)| {
                // Float addition is not associative; sum in a fixed order
                weights.sort_by(f64::total_cmp);
                let summed: f64 = weights.iter().sum();

                let platforms_present = source_texts
                    .values()
                    .filter(|text| text.contains(keyword.as_str()))
                    .count() as f64;
                let platform_multiplier = 1.0 + platforms_present / total_sources;

                (keyword, summed * platform_multiplier)
            })
            .collect()
    }

    /// Top `limit` keywords by score, ties broken by keyword ascending
    pub fn rank(&self, records: &[TrendRecord], limit: usize) -> Vec<RankedKeyword> {
        rank_scores(&self.aggregate(records), limit)
    }

    /// Aggregate score of a single topic, zero when no source contributed it
    pub fn score_topic(&self, records: &[TrendRecord], topic: &str) -> f64 {
        let keyword = normalize_topic(topic);
        self.aggregate(records).get(&keyword).copied().unwrap_or(0.0)
    }

    fn is_stop_word(&self, keyword: &str) -> bool {
        self.stop_words.iter().any(|w| w == keyword)
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

/// Sort a score map into a deterministic ranking
pub fn rank_scores(scores: &KeywordScore, limit: usize) -> Vec<RankedKeyword> {
    let mut ranked: Vec<RankedKeyword> = scores
        .iter()
        .map(|(keyword, score)| RankedKeyword {
            keyword: keyword.clone(),
            score: *score,
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.keyword.cmp(&b.keyword)));
    ranked.truncate(limit);
    ranked
}

/// Group ranked keywords by category, preserving rank order within each group.
///
/// Every category is present in the result, possibly with no keywords.
pub fn categorize(
    ranked: &[RankedKeyword],
    classifier: &Classifier,
) -> BTreeMap<Category, Vec<RankedKeyword>> {
    let mut grouped: BTreeMap<Category, Vec<RankedKeyword>> =
        Category::ALL.into_iter().map(|c| (c, Vec::new())).collect();

    for entry in ranked {
        grouped
            .entry(classifier.classify(&entry.keyword))
            .or_default()
            .push(entry.clone());
    }

    grouped
}

/// Concatenated lowercase text per source
fn source_texts(records: &[TrendRecord]) -> BTreeMap<SourceId, String> {
    let mut texts: BTreeMap<SourceId, String> = BTreeMap::new();
    for record in records {
        let text = texts.entry(record.source).or_default();
        text.push(' ');
        text.push_str(&record.text().to_lowercase());
    }
    texts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<TrendRecord> {
        vec![
            TrendRecord::new(SourceId::Social, "#Crypto", 1.0),
            TrendRecord::new(SourceId::Social, "#DeFi", 1.0),
            TrendRecord::new(SourceId::Forum, "Latest crypto market analysis", 12000.0),
            TrendRecord::new(SourceId::News, "Latest crypto market analysis", 1.0),
            TrendRecord::new(SourceId::News, "Decentralized finance gaining momentum", 1.0),
            TrendRecord::new(SourceId::Search, "cryptocurrency", 100.0),
            TrendRecord::new(SourceId::Search, "defi projects", 55.0),
        ]
    }

    #[test]
    fn test_hashtag_and_headline_scenario() {
        let aggregator = Aggregator::default();
        let records = vec![
            TrendRecord::new(SourceId::Social, "#AI", 10.0),
            TrendRecord::new(SourceId::News, "ai trends today", 5.0),
        ];

        let scores = aggregator.aggregate(&records);

        // Only the hashtag contributes weight (10 x 3); the headline's "ai" is
        // too short to be tokenized. Both sources still mention "ai" in their
        // text, so the presence multiplier is 1 + 2/4.
        assert_eq!(scores.get("ai").copied(), Some(30.0 * 1.5));
        assert_eq!(scores.get("trends").copied(), Some(2.0 * 1.25));
        assert_eq!(scores.get("today").copied(), Some(2.0 * 1.25));
    }

    #[test]
    fn test_cross_platform_bonus() {
        let aggregator = Aggregator::default();
        let scores = aggregator.aggregate(&sample_records());

        // "crypto": social 3 + forum 2 + news 2 = 7; present in social, forum,
        // news and search ("cryptocurrency") texts
        let crypto = scores["crypto"];
        assert!((crypto - 7.0 * 2.0).abs() < 1e-9);

        // "defi": social 3; present in social and search texts
        let defi = scores["defi"];
        assert!((defi - 3.0 * 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_stop_words_removed() {
        let aggregator = Aggregator::default();
        let records = vec![TrendRecord::new(SourceId::Forum, "Top NFT collections this week", 1.0)];
        let scores = aggregator.aggregate(&records);
        assert!(!scores.contains_key("this"));
        assert!(scores.contains_key("collections"));
        assert!(scores.contains_key("week"));
    }

    #[test]
    fn test_order_independent() {
        let aggregator = Aggregator::default();
        let records = sample_records();
        let expected = aggregator.rank(&records, 50);

        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(aggregator.rank(&reversed, 50), expected);

        let mut rotated = records.clone();
        rotated.rotate_left(3);
        assert_eq!(aggregator.rank(&rotated, 50), expected);

        let mut interleaved: Vec<_> = records.iter().step_by(2).cloned().collect();
        interleaved.extend(records.iter().skip(1).step_by(2).cloned());
        assert_eq!(aggregator.rank(&interleaved, 50), expected);
    }

    #[test]
    fn test_fractional_sums_order_independent() {
        let aggregator = Aggregator::default();
        let records = vec![
            TrendRecord::new(SourceId::Search, "tokenomics", 1.0),
            TrendRecord::new(SourceId::Search, "tokenomics", 2.0),
            TrendRecord::new(SourceId::Search, "tokenomics", 3.0),
        ];
        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(
            aggregator.aggregate(&records)["tokenomics"].to_bits(),
            aggregator.aggregate(&reversed)["tokenomics"].to_bits()
        );
    }

    #[test]
    fn test_rank_ties_break_lexically() {
        let aggregator = Aggregator::default();
        let records = vec![
            TrendRecord::new(SourceId::Social, "#Zebra", 1.0),
            TrendRecord::new(SourceId::Social, "#Apple", 1.0),
            TrendRecord::new(SourceId::Social, "#Mango", 1.0),
        ];
        let ranked = aggregator.rank(&records, 10);
        let keywords: Vec<_> = ranked.iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(keywords, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_rank_limit_and_order() {
        let aggregator = Aggregator::default();
        let ranked = aggregator.rank(&sample_records(), 3);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].keyword, "crypto");
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_score_topic() {
        let aggregator = Aggregator::default();
        let records = sample_records();
        assert!((aggregator.score_topic(&records, "#Crypto") - 14.0).abs() < 1e-9);
        assert_eq!(aggregator.score_topic(&records, "unheard of"), 0.0);
    }

    #[test]
    fn test_empty_input() {
        let aggregator = Aggregator::default();
        assert!(aggregator.aggregate(&[]).is_empty());
        assert!(aggregator.rank(&[], 5).is_empty());
    }

    #[test]
    fn test_categorize() {
        let aggregator = Aggregator::default();
        let classifier = Classifier::default();
        let ranked = aggregator.rank(&sample_records(), 20);
        let grouped = categorize(&ranked, &classifier);

        assert_eq!(grouped.len(), Category::ALL.len());
        let crypto: Vec<_> = grouped[&Category::Crypto].iter().map(|r| r.keyword.as_str()).collect();
        assert!(crypto.contains(&"crypto"));
        assert!(crypto.contains(&"defi projects"));
        assert!(grouped[&Category::Finance].iter().any(|r| r.keyword == "market"));
        assert!(grouped[&Category::Crypto].windows(2).all(|w| w[0].score >= w[1].score));
    }
}
