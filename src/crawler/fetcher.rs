//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - Classifying a single GET attempt
//! - Bounded retries with linear backoff
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 2xx with readable body | Success |
//! | Any other HTTP status | Retry |
//! | Timeout / connection error | Retry |
//! | Body read failure | Retry |
//!
//! After attempt `n` fails the task sleeps `n` backoff units. Once `max_try`
//! attempts have failed the address is given up on.

use crate::config::FetchConfig;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Outcome of a single GET attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttempt {
    /// 2xx response with its body
    Success(String),

    /// Anything worth retrying, with a description for the log
    Transient(String),
}

/// Result of a fetch with retries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// The page was fetched
    Success {
        /// The requested URL
        url: Url,
        /// Page body content
        body: String,
        /// Number of attempts it took (1 = first try)
        attempts: u32,
    },

    /// Every attempt failed
    Exhausted {
        /// The requested URL
        url: Url,
        /// Number of attempts made
        attempts: u32,
        /// Description of the final failure
        last_error: String,
    },
}

/// How many times to try an address and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, at least 1
    pub max_try: u32,

    /// Wait after failed attempt `n` is `n * backoff_unit`
    pub backoff_unit: Duration,
}

impl RetryPolicy {
    /// Delay to wait after the given 1-based failed attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_try: config.max_try.max(1),
            backoff_unit: Duration::from_millis(config.backoff_unit_ms),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use poesy_loader::config::FetchConfig;
/// use poesy_loader::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages with retry
///
/// Cloning is cheap; the underlying client shares its connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Performs one GET and classifies the outcome
    pub async fn attempt(&self, url: &Url) -> FetchAttempt {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return FetchAttempt::Transient(describe_error(&e)),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchAttempt::Transient(format!("HTTP {}", status.as_u16()));
        }

        match response.text().await {
            Ok(body) => FetchAttempt::Success(body),
            Err(e) => FetchAttempt::Transient(format!("failed to read body: {}", e)),
        }
    }

    /// Fetches a URL, retrying up to `max_try` times
    ///
    /// Never fails outright: exhaustion is reported as
    /// [`FetchResult::Exhausted`] for the caller to skip and log. Backoff
    /// sleeps only suspend the calling task.
    pub async fn fetch(&self, url: &Url) -> FetchResult {
        let mut last_error = String::new();

        for attempt in 1..=self.policy.max_try {
            match self.attempt(url).await {
                FetchAttempt::Success(body) => {
                    tracing::debug!("Fetched {} (attempt {})", url, attempt);
                    return FetchResult::Success {
                        url: url.clone(),
                        body,
                        attempts: attempt,
                    };
                }
                FetchAttempt::Transient(error) => {
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        self.policy.max_try,
                        url,
                        error
                    );
                    last_error = error;

                    if attempt < self.policy.max_try {
                        tokio::time::sleep(self.policy.backoff(attempt)).await;
                    }
                }
            }
        }

        tracing::error!("MAX_TRY exceeded for {}: {}", url, last_error);
        FetchResult::Exhausted {
            url: url.clone(),
            attempts: self.policy.max_try,
            last_error,
        }
    }
}

/// Classifies a transport error for logging
fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        format!("connection error: {}", error)
    } else {
        error.to_string()
    }
}
