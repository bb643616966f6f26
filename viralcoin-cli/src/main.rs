//! ViralCoin CLI
//!
//! Turns trending topics into token configurations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use viralcoin_core::{
    Classifier, EngineConfig, RandomChooser, SeededChooser, SharedChooser, SourceId, TokenDeriver,
    TokenDetails,
};
use viralcoin_runtime::{Pipeline, PipelineConfig};
use viralcoin_sources::{HeadlineSource, HttpConfig, JsonFeedSource, MockSource, SourceAdapter};

#[derive(Parser)]
#[command(name = "viralcoin")]
#[command(author, version, about = "ViralCoin: trend-driven token configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1", global = true)]
    verbose: u8,

    /// Per-source fetch timeout in seconds
    #[arg(long, default_value = "10", global = true)]
    timeout: u64,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect trends and print the ranked report
    Trends {
        /// Number of top keywords to show
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Drop keywords scoring below this
        #[arg(long, default_value = "0.0")]
        min_score: f64,

        #[command(flatten)]
        sources: SourceArgs,
    },

    /// Classify a topic into a category and token archetype
    Classify {
        /// Topic to classify
        topic: String,
    },

    /// Derive a token configuration for a topic
    Token {
        /// Trending topic
        topic: String,

        /// Trend score (default: the topic's aggregate score)
        #[arg(short, long)]
        score: Option<f64>,

        /// Seed for the name suffix choice
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        sources: SourceArgs,
    },

    /// Suggest a token for the current top trend
    Suggest {
        /// Seed for the name suffix choice
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        sources: SourceArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Restrict to one source (all, social, forum, search, news)
    #[arg(long, default_value = "all")]
    source: String,

    /// JSON trend feed as SOURCE=URL (repeatable)
    #[arg(long = "feed", value_parser = parse_source_url)]
    feeds: Vec<(SourceId, String)>,

    /// HTML headline page as SOURCE=URL (repeatable)
    #[arg(long = "headlines", value_parser = parse_source_url)]
    headlines: Vec<(SourceId, String)>,

    /// Use the built-in sample sources instead of feeds
    #[arg(long, conflicts_with_all = ["feeds", "headlines"])]
    mock: bool,

    /// CSS selector for headline pages
    #[arg(long, default_value = "h2, h3")]
    selector: String,

    /// Records requested from each source
    #[arg(long, default_value = "10")]
    per_source: usize,
}

impl SourceArgs {
    fn source_filter(&self) -> Result<Option<SourceId>> {
        if self.source.eq_ignore_ascii_case("all") {
            return Ok(None);
        }
        Ok(Some(self.source.parse()?))
    }

    fn has_network_sources(&self) -> bool {
        !self.feeds.is_empty() || !self.headlines.is_empty()
    }
}

fn parse_source_url(value: &str) -> Result<(SourceId, String), String> {
    let (source, url) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SOURCE=URL, got '{}'", value))?;
    let source: SourceId = source.parse().map_err(|e: viralcoin_core::EngineError| e.to_string())?;
    if url.trim().is_empty() {
        return Err(format!("missing URL for {}", source));
    }
    Ok((source, url.trim().to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let engine = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match &cli.command {
        Commands::Trends {
            limit,
            min_score,
            sources,
        } => {
            let config = pipeline_config(&cli, engine, sources).with_min_score(*min_score);
            let pipeline = build_pipeline(config, chooser(None), sources)?;
            let report = pipeline.analyze(*limit).await;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.to_markdown());
            }
        }
        Commands::Classify { topic } => {
            let classifier = Classifier::new(engine.classifier.clone());
            let category = classifier.classify(topic);
            let archetype = classifier.classify_token_archetype(topic);

            if cli.json {
                let value = serde_json::json!({
                    "topic": topic,
                    "category": category,
                    "archetype": archetype,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{}: {} ({})", topic, category, archetype);
            }
        }
        Commands::Token {
            topic,
            score,
            seed,
            sources,
        } => {
            let as_of = chrono::Utc::now().date_naive();

            let details = match score {
                // An explicit score needs no source data
                Some(score) => {
                    engine.validate()?;
                    TokenDeriver::new(&engine, chooser(*seed)).details(topic, *score, as_of)?
                }
                None => {
                    let config = pipeline_config(&cli, engine, sources);
                    let pipeline = build_pipeline(config, chooser(*seed), sources)?;
                    pipeline.suggest_token(Some(topic), as_of).await?
                }
            };
            print_details(&details, cli.json)?;
        }
        Commands::Suggest { seed, sources } => {
            let config = pipeline_config(&cli, engine, sources);
            let pipeline = build_pipeline(config, chooser(*seed), sources)?;
            let as_of = chrono::Utc::now().date_naive();

            let details = pipeline.suggest_token(None, as_of).await?;
            print_details(&details, cli.json)?;
        }
    }

    Ok(())
}

fn chooser(seed: Option<u64>) -> SharedChooser {
    match seed {
        Some(seed) => Arc::new(SeededChooser::new(seed)),
        None => Arc::new(RandomChooser),
    }
}

fn pipeline_config(cli: &Cli, engine: EngineConfig, sources: &SourceArgs) -> PipelineConfig {
    PipelineConfig::default()
        .with_engine(engine)
        .with_timeout(cli.timeout)
        .with_limit(sources.per_source)
}

/// Register feed and headline sources, or the sample sources with `--mock`
fn build_pipeline(config: PipelineConfig, chooser: SharedChooser, args: &SourceArgs) -> Result<Pipeline> {
    if !args.mock && !args.has_network_sources() {
        bail!("No trend sources given: pass --feed, --headlines or --mock");
    }

    let filter = args.source_filter()?;
    let wanted = |source: SourceId| filter.map_or(true, |f| f == source);
    let http = HttpConfig::default().with_timeout(config.fetch_timeout_secs);

    let mut pipeline = Pipeline::new(config, chooser)?;

    if args.mock {
        info!("Using sample sources");
        for source in MockSource::all().into_iter().filter(|s| wanted(s.source())) {
            pipeline = pipeline.with_cached_source(source);
        }
        return Ok(pipeline);
    }

    for (source, url) in args.feeds.iter().filter(|(s, _)| wanted(*s)) {
        let feed = JsonFeedSource::new(*source, url, &http)?;
        pipeline = pipeline.with_cached_source(feed);
    }

    for (source, url) in args.headlines.iter().filter(|(s, _)| wanted(*s)) {
        let page = HeadlineSource::new(*source, url, &args.selector, &http)?;
        pipeline = pipeline.with_cached_source(page);
    }

    Ok(pipeline)
}

fn print_details(details: &TokenDetails, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(details)?);
        return Ok(());
    }

    let c = &details.config;
    println!("{} ({})", c.name, c.symbol);
    println!("  {}", c.description);
    println!("  Category:        {} / {}", details.category, details.archetype);
    println!("  Trend score:     {:.2}", details.trend_score);
    println!("  Initial supply:  {}", c.initial_supply);
    println!(
        "  Fees:            tax {}%, liquidity {}%, marketing {}% (total {}%)",
        c.tax_fee_percent,
        c.liquidity_fee_percent,
        c.marketing_fee_percent,
        c.total_fee_percent()
    );
    println!(
        "  Limits:          wallet {}%, transaction {}%, swap threshold {}%",
        c.max_wallet_percent, c.max_transaction_percent, c.swap_threshold_percent
    );
    println!("  Market cap:      ${:.0}", c.estimated_market_cap);
    println!("  Liquidity:       ${:.0}", c.estimated_initial_liquidity);
    println!("  Launch date:     {}", details.launch_date);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_url() {
        let (source, url) = parse_source_url("reddit=https://example.com/hot.json").unwrap();
        assert_eq!(source, SourceId::Forum);
        assert_eq!(url, "https://example.com/hot.json");

        assert!(parse_source_url("news").is_err());
        assert!(parse_source_url("radio=https://example.com").is_err());
        assert!(parse_source_url("news=").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "viralcoin",
            "--json",
            "trends",
            "--limit",
            "5",
            "--feed",
            "search=https://example.com/terms.json",
            "--feed",
            "social=https://example.com/tags.json",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Trends { limit, sources, .. } => {
                assert_eq!(limit, 5);
                assert_eq!(sources.feeds.len(), 2);
                assert!(sources.has_network_sources());
                assert_eq!(sources.source_filter().unwrap(), None);
            }
            _ => panic!("expected trends"),
        }
    }

    #[test]
    fn test_mock_pipeline_respects_source_filter() {
        let cli = Cli::try_parse_from(["viralcoin", "suggest", "--mock", "--source", "twitter"]).unwrap();
        let Commands::Suggest { sources, .. } = &cli.command else {
            panic!("expected suggest");
        };

        let config = pipeline_config(&cli, EngineConfig::default(), sources);
        let pipeline = build_pipeline(config, chooser(Some(1)), sources).unwrap();
        assert_eq!(pipeline.source_count(), 1);
    }

    #[test]
    fn test_sources_required() {
        let cli = Cli::try_parse_from(["viralcoin", "trends"]).unwrap();
        let Commands::Trends { sources, .. } = &cli.command else {
            panic!("expected trends");
        };

        let config = pipeline_config(&cli, EngineConfig::default(), sources);
        assert!(build_pipeline(config, chooser(None), sources).is_err());

        assert!(Cli::try_parse_from([
            "viralcoin",
            "trends",
            "--mock",
            "--feed",
            "news=https://example.com/news.json",
        ])
        .is_err());
    }
}
