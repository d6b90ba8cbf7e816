//! Custom error types for translation operations

use thiserror::Error;

/// Translation-related errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Service answered with a non-2xx status
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        message: String,
    },

    /// Network error
    #[error("Network error: {message}")]
    NetworkError {
        /// Transport failure description
        message: String,
    },

    /// Request timeout
    #[error("Request timeout")]
    TimeoutError,

    /// Invalid response from API
    #[error("Invalid response: {message}")]
    InvalidResponseError {
        /// What was wrong with the body
        message: String,
    },

    /// File operation error
    #[error("File error: {path} - {message}")]
    FileError {
        /// Path that could not be read or written
        path: String,
        /// Underlying failure
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Which setting is invalid
        message: String,
    },

    /// Unexpected failure inside the client
    #[error("Internal error: {0}")]
    InternalError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TranslationError {
    /// Build a [`TranslationError::FileError`] for `path`
    pub fn file(path: impl AsRef<std::path::Path>, err: impl std::fmt::Display) -> Self {
        TranslationError::FileError {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    /// Whether another attempt at the same request may succeed.
    ///
    /// Only transport failures and non-2xx answers are transient. A body that
    /// arrived but cannot be understood is final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TranslationError::ApiError { .. }
                | TranslationError::NetworkError { .. }
                | TranslationError::TimeoutError
                | TranslationError::HttpError(_)
        )
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;
