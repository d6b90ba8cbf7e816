//! Configuration management

use std::time::Duration;
use tracing::warn;

use crate::core::errors::{Result, TranslationError};
use crate::core::retry::RetryPolicy;

/// Upper bound accepted for `max_concurrent`
pub const MAX_CONCURRENT_LIMIT: usize = 10_000;

/// Connection and scheduling settings for [`crate::TranslationClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service root, e.g. `https://mt.example.com/api`
    pub base_url: String,
    /// Bearer token sent with every request
    pub token: String,
    /// Maximum number of remote calls in flight at once
    pub max_concurrent: usize,
    /// Time allowed to establish a connection
    pub connect_timeout: Duration,
    /// Time allowed between two reads of the response
    pub read_timeout: Duration,
    /// Time allowed to upload the request body
    pub write_timeout: Duration,
    /// Upper bound of pooled connections
    pub max_connections: usize,
    /// Idle keep-alive connections kept per host
    pub max_idle_connections: usize,
    /// Retry policy wrapped around every call
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            max_concurrent: 20,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(600),
            write_timeout: Duration::from_secs(60),
            max_connections: 200,
            max_idle_connections: 100,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration with default limits for the given service
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            ..Default::default()
        }
    }

    /// Override the concurrency ceiling
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Override the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Full URL of the document translation endpoint
    pub fn endpoint_url(&self) -> String {
        format!("{}/translate-document", self.base_url.trim_end_matches('/'))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(config_error("base URL is required"));
        }

        if self.token.is_empty() {
            return Err(config_error("API token is required"));
        }

        if self.max_concurrent == 0 {
            return Err(config_error("max_concurrent must be greater than 0"));
        }

        if self.max_concurrent > MAX_CONCURRENT_LIMIT {
            return Err(TranslationError::ConfigError {
                message: format!(
                    "max_concurrent must not exceed {} (got {})",
                    MAX_CONCURRENT_LIMIT, self.max_concurrent
                ),
            });
        }

        if self.retry.max_attempts == 0 {
            return Err(config_error("retry policy needs at least one attempt"));
        }

        if self.retry.min_delay > self.retry.max_delay {
            return Err(config_error("retry min_delay exceeds max_delay"));
        }

        if self.max_concurrent > self.max_connections {
            warn!(
                "max_concurrent ({}) exceeds the connection pool size ({})",
                self.max_concurrent, self.max_connections
            );
        }

        Ok(())
    }
}

fn config_error(message: &str) -> TranslationError {
    TranslationError::ConfigError {
        message: message.to_string(),
    }
}
