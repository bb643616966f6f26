//! ViralCoin Runtime
//!
//! Runs the engine end to end:
//! - Collects every source concurrently, each call bounded by a timeout
//! - Degrades failed or slow sources to empty batches
//! - Aggregates, ranks and categorizes into a report
//! - Suggests a token for a topic or the top trend

pub mod report;
pub mod pipeline;

pub use report::*;
pub use pipeline::*;
