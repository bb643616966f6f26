//! ViralCoin Sources
//!
//! Adapters that turn platform data into normalized trend records:
//! - Common adapter trait and error type
//! - HTTP client with user agent rotation and retries
//! - JSON feed and HTML headline adapters
//! - Mock adapters carrying sample data
//! - TTL cache with single-flight refresh

pub mod adapter;
pub mod http;
pub mod feed;
pub mod mock;
pub mod cache;

pub use adapter::*;
pub use http::*;
pub use feed::*;
pub use mock::*;
pub use cache::*;
