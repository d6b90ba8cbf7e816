//! Async client for the remote document translation service

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error};

use crate::core::config::ClientConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{
    TranslateDocumentRequest, TranslateDocumentResponse, TranslationJob, TranslationResult,
};

/// Something that can turn a [`TranslationJob`] into a [`TranslationResult`].
///
/// Implementations never fail outright: every error is logged and reported
/// as [`TranslationResult::Failed`].
#[async_trait]
pub trait TranslationEndpoint: Send + Sync {
    /// Translate one document
    async fn translate(&self, job: TranslationJob) -> TranslationResult;
}

#[async_trait]
impl<T: TranslationEndpoint + ?Sized> TranslationEndpoint for Arc<T> {
    async fn translate(&self, job: TranslationJob) -> TranslationResult {
        (**self).translate(job).await
    }
}

/// HTTP client owning the connection pool and the concurrency gate
#[derive(Debug, Clone)]
pub struct TranslationClient {
    client: reqwest::Client,
    config: Arc<ClientConfig>,
    semaphore: Arc<Semaphore>,
}

impl TranslationClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.token)).map_err(|e| {
            TranslationError::ConfigError {
                message: format!("invalid token: {}", e),
            }
        })?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        // reqwest has no write timeout, so bound the whole exchange instead
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .timeout(config.connect_timeout + config.write_timeout + config.read_timeout)
            .pool_max_idle_per_host(config.max_idle_connections)
            .build()?;

        debug!(
            "Client for {} (max_concurrent={}, pool={})",
            config.endpoint_url(),
            config.max_concurrent,
            config.max_connections
        );

        let semaphore = Arc::new(Semaphore::new(config.max_concurrent));

        Ok(Self {
            client,
            config: Arc::new(config),
            semaphore,
        })
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Number of remote calls currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.config.max_concurrent - self.semaphore.available_permits()
    }

    /// Translate a job, surfacing the error instead of logging it
    pub async fn try_translate(&self, job: &TranslationJob) -> Result<String> {
        let filename = job.synthetic_filename();
        let request = TranslateDocumentRequest::from_job(job, &filename);

        // Held across every retry; released on drop whatever the outcome
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| TranslationError::InternalError(e.to_string()))?;

        let request = &request;
        let body = self
            .config
            .retry
            .run(move || self.send_request(request))
            .await?;

        let response: TranslateDocumentResponse =
            serde_json::from_str(&body).map_err(|e| TranslationError::InvalidResponseError {
                message: e.to_string(),
            })?;

        let mut files = response.files;
        files
            .remove(&filename)
            .ok_or_else(|| TranslationError::InvalidResponseError {
                message: format!("No {} in response", filename),
            })
    }

    /// Send one request and return the raw body of a 2xx answer
    async fn send_request(&self, request: &TranslateDocumentRequest) -> Result<String> {
        let response = self
            .client
            .post(self.config.endpoint_url())
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TranslationError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response.text().await.map_err(transport_error)
    }
}

#[async_trait]
impl TranslationEndpoint for TranslationClient {
    async fn translate(&self, job: TranslationJob) -> TranslationResult {
        match self.try_translate(&job).await {
            Ok(content) => TranslationResult::Translated(content),
            Err(e) => {
                error!("Error occurred: {}", e);
                TranslationResult::Failed
            }
        }
    }
}

fn transport_error(err: reqwest::Error) -> TranslationError {
    if err.is_timeout() {
        TranslationError::TimeoutError
    } else {
        TranslationError::NetworkError {
            message: err.to_string(),
        }
    }
}
