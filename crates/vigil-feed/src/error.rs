//! Error types for the feed crate.

use thiserror::Error;

/// Errors from the push channel and the notification REST API.
#[derive(Debug, Error)]
pub enum FeedError {
    /// API request failed (transient, retryable)
    #[error("API request failed (transient): {0}")]
    ApiTransientError(String),

    /// API request failed (permanent)
    #[error("API request failed: {0}")]
    ApiError(String),

    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl FeedError {
    /// Check if this error is retryable (transient network/API issues).
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::ApiTransientError(_) | FeedError::ConnectionFailed(_) => true,
            FeedError::HttpError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Classify an HTTP status code into the appropriate error type.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            408 | 429 | 500 | 502 | 503 | 504 => {
                FeedError::ApiTransientError(format!("Server error ({status}): {body}"))
            }
            _ => FeedError::ApiError(format!("HTTP {status}: {body}")),
        }
    }
}

/// Result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;
