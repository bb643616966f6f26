//! Network adapters
//!
//! - [`JsonFeedSource`]: a JSON endpoint listing trends
//! - [`HeadlineSource`]: an HTML front page scraped with a CSS selector

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

use viralcoin_core::{SourceId, TrendRecord};

use crate::{create_http_client, fetch_text, HttpConfig, SourceAdapter, SourceError};

/// Raw score assumed for a search term that carries none
const DEFAULT_SEARCH_SCORE: f64 = 50.0;

/// Upper bound of a search-interest score
const MAX_SEARCH_SCORE: f64 = 100.0;

/// Shortest headline text worth keeping
const MIN_HEADLINE_LEN: usize = 3;

/// One entry of a JSON trend feed
#[derive(Debug, Deserialize)]
struct FeedItem {
    #[serde(alias = "title", alias = "term", alias = "topic")]
    name: String,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default, alias = "tweet_volume")]
    volume: Option<u64>,
    #[serde(default)]
    description: Option<String>,
}

/// Feeds come either as a bare array or wrapped in `{"trends": [...]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Feed {
    Items(Vec<FeedItem>),
    Wrapped { trends: Vec<FeedItem> },
}

/// Parse a JSON trend feed into at most `limit` records.
///
/// Items with a blank name are skipped. A missing score defaults to 50 for
/// search terms and 1 for everything else. Negative scores become 0 and
/// search scores are capped at 100.
pub fn parse_feed(source: SourceId, body: &str, limit: usize) -> Result<Vec<TrendRecord>, SourceError> {
    let feed: Feed = serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;
    let items = match feed {
        Feed::Items(items) => items,
        Feed::Wrapped { trends } => trends,
    };

    let default_score = match source {
        SourceId::Search => DEFAULT_SEARCH_SCORE,
        _ => 1.0,
    };

    Ok(items
        .into_iter()
        .filter(|item| !item.name.trim().is_empty())
        .take(limit)
        .map(|item| {
            let score = item
                .score
                .map_or(default_score, |score| clamp_score(source, score));
            let mut record = TrendRecord::new(source, item.name.trim(), score);
            record.volume = item.volume;
            record.description = item.description.filter(|d| !d.trim().is_empty());
            record
        })
        .collect())
}

fn clamp_score(source: SourceId, score: f64) -> f64 {
    if !score.is_finite() {
        return 0.0;
    }
    match source {
        SourceId::Search => score.clamp(0.0, MAX_SEARCH_SCORE),
        _ => score.max(0.0),
    }
}

/// Extract headline records from an HTML page.
///
/// Text of every element matching `selector` becomes one record, whitespace
/// collapsed and case-insensitive duplicates dropped.
pub fn parse_headlines(
    source: SourceId,
    html: &str,
    selector: &str,
    limit: usize,
) -> Result<Vec<TrendRecord>, SourceError> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);

    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::new();

    for element in document.select(&selector) {
        if records.len() >= limit {
            break;
        }

        let text = element.text().collect::<Vec<_>>().join(" ");
        let headline = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if headline.chars().count() < MIN_HEADLINE_LEN {
            continue;
        }

        if seen.insert(headline.to_lowercase()) {
            records.push(TrendRecord::new(source, &headline, 1.0));
        }
    }

    Ok(records)
}

fn parse_selector(selector: &str) -> Result<Selector, SourceError> {
    Selector::parse(selector).map_err(|e| SourceError::InvalidSelector(format!("{}: {}", selector, e)))
}

/// Trend source backed by a JSON endpoint
pub struct JsonFeedSource {
    source: SourceId,
    name: String,
    url: String,
    client: Client,
    max_retries: u32,
}

impl JsonFeedSource {
    pub fn new(source: SourceId, url: &str, config: &HttpConfig) -> Result<Self, SourceError> {
        Ok(Self {
            source,
            name: format!("{}-feed", source),
            url: url.to_string(),
            client: create_http_client(config)?,
            max_retries: config.max_retries,
        })
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

#[async_trait]
impl SourceAdapter for JsonFeedSource {
    fn source(&self) -> SourceId {
        self.source
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<TrendRecord>, SourceError> {
        let body = fetch_text(&self.client, &self.url, self.max_retries).await?;
        let records = parse_feed(self.source, &body, limit)?;
        debug!("{} returned {} records", self.name, records.len());
        Ok(records)
    }
}

/// Trend source scraped from an HTML page of headlines
pub struct HeadlineSource {
    source: SourceId,
    name: String,
    url: String,
    selector: String,
    client: Client,
    max_retries: u32,
}

impl HeadlineSource {
    /// The selector is validated here so a bad one fails at startup
    pub fn new(
        source: SourceId,
        url: &str,
        selector: &str,
        config: &HttpConfig,
    ) -> Result<Self, SourceError> {
        parse_selector(selector)?;

        Ok(Self {
            source,
            name: format!("{}-headlines", source),
            url: url.to_string(),
            selector: selector.to_string(),
            client: create_http_client(config)?,
            max_retries: config.max_retries,
        })
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

#[async_trait]
impl SourceAdapter for HeadlineSource {
    fn source(&self) -> SourceId {
        self.source
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<TrendRecord>, SourceError> {
        let html = fetch_text(&self.client, &self.url, self.max_retries).await?;
        let records = parse_headlines(self.source, &html, &self.selector, limit)?;
        debug!("{} returned {} headlines", self.name, records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        let body = r##"[
            {"name": "#AI", "tweet_volume": 42000},
            {"name": "#Crypto", "tweet_volume": null},
            {"name": "   "}
        ]"##;

        let records = parse_feed(SourceId::Social, body, 10).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "#AI");
        assert_eq!(records[0].raw_score, 1.0);
        assert_eq!(records[0].volume, Some(42000));
        assert_eq!(records[1].volume, None);
    }

    #[test]
    fn test_parse_wrapped_with_aliases() {
        let body = r#"{"trends": [
            {"term": "cryptocurrency", "score": 100},
            {"term": "tokenomics"},
            {"topic": "dao governance", "score": 45, "description": "voting models"}
        ]}"#;

        let records = parse_feed(SourceId::Search, body, 10).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].raw_score, 100.0);
        assert_eq!(records[1].raw_score, 50.0);
        assert_eq!(records[2].description.as_deref(), Some("voting models"));
        assert!(records.iter().all(|r| r.source == SourceId::Search));
    }

    #[test]
    fn test_parse_feed_clamps_scores() {
        let body = r#"[
            {"term": "rugpull", "score": -80},
            {"term": "moonshot", "score": 250},
            {"term": "staking", "score": 64.5}
        ]"#;

        let search = parse_feed(SourceId::Search, body, 10).unwrap();
        let scores: Vec<_> = search.iter().map(|r| r.raw_score).collect();
        assert_eq!(scores, vec![0.0, 100.0, 64.5]);

        let social = parse_feed(SourceId::Social, body, 10).unwrap();
        let scores: Vec<_> = social.iter().map(|r| r.raw_score).collect();
        assert_eq!(scores, vec![0.0, 250.0, 64.5]);

        assert_eq!(clamp_score(SourceId::News, f64::NAN), 0.0);
        assert_eq!(clamp_score(SourceId::Search, f64::INFINITY), 0.0);
    }

    #[test]
    fn test_parse_feed_limit() {
        let body = r#"[{"title": "one"}, {"title": "two"}, {"title": "three"}]"#;
        let records = parse_feed(SourceId::News, body, 2).unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two"]);
    }

    #[test]
    fn test_parse_feed_malformed() {
        assert!(matches!(
            parse_feed(SourceId::News, "<html>", 10),
            Err(SourceError::Parse(_))
        ));
        assert!(matches!(
            parse_feed(SourceId::News, r#"{"items": []}"#, 10),
            Err(SourceError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_headlines() {
        let html = r#"
            <html>
            <body>
                <h2 class="headline">Decentralized finance
                    gaining momentum</h2>
                <h2 class="headline">DECENTRALIZED FINANCE GAINING MOMENTUM</h2>
                <h2 class="headline">ok</h2>
                <h2 class="headline"><a href="/x">Top NFT <b>collections</b> this week</a></h2>
                <h2>Unrelated heading</h2>
            </body>
            </html>
        "#;

        let records = parse_headlines(SourceId::News, html, "h2.headline", 10).unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Decentralized finance gaining momentum", "Top NFT collections this week"]
        );
        assert!(records.iter().all(|r| r.source == SourceId::News && r.raw_score == 1.0));
    }

    #[test]
    fn test_parse_headlines_limit() {
        let html = "<ul><li>alpha one</li><li>beta two</li><li>gamma three</li></ul>";
        let records = parse_headlines(SourceId::Forum, html, "li", 2).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_invalid_selector() {
        assert!(matches!(
            parse_headlines(SourceId::News, "<p>x</p>", "h2[", 10),
            Err(SourceError::InvalidSelector(_))
        ));
        assert!(HeadlineSource::new(SourceId::News, "http://localhost", "<<", &HttpConfig::default()).is_err());
    }
}
