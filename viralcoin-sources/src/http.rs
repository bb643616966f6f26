//! HTTP client setup shared by the network adapters

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::SourceError;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after a connection failure or 5xx response
    pub max_retries: u32,
    /// Fixed user agent; rotated from a built-in list when unset
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            max_retries: 2,
            user_agent: None,
        }
    }
}

impl HttpConfig {
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }
}

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Pick a user agent from the rotation list
pub fn random_user_agent() -> &'static str {
    use rand::seq::SliceRandom;
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Create an HTTP client for the network adapters
pub fn create_http_client(config: &HttpConfig) -> Result<Client, SourceError> {
    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| random_user_agent().to_string());

    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(user_agent)
        .build()
        .map_err(|e| SourceError::ClientBuild(e.to_string()))
}

/// GET a URL and return the body, retrying transient failures
pub async fn fetch_text(client: &Client, url: &str, max_retries: u32) -> Result<String, SourceError> {
    let mut attempt = 0;

    loop {
        attempt += 1;
        debug!("GET {} (attempt {})", url, attempt);

        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                return Ok(response.text().await?);
            }
            Ok(response) => {
                let status = response.status();
                if !status.is_server_error() || attempt > max_retries {
                    return Err(SourceError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
                warn!("{} returned {}, retrying", url, status);
            }
            Err(e) => {
                if attempt > max_retries {
                    return Err(e.into());
                }
                warn!("Request to {} failed: {}, retrying", url, e);
            }
        }
    }
}
