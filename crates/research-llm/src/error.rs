//! Error types for inference backends

use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors raised while talking to an inference backend
#[derive(Error, Debug)]
pub enum LLMError {
    /// Request reached the backend but failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Credentials were rejected
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// Backend throttled the request
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Backend rejected the request body
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown model identifier
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[cfg(any(feature = "gemini", feature = "openai"))]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Response did not have the expected shape
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Missing or invalid provider settings
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl LLMError {
    /// Whether retrying the same request later could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimitExceeded(_) | Self::RequestFailed(_) => true,
            #[cfg(any(feature = "gemini", feature = "openai"))]
            Self::HttpError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Map a non-success HTTP status from a chat backend into an [`LLMError`]
#[cfg_attr(not(any(feature = "gemini", feature = "openai")), allow(dead_code))]
pub(crate) fn status_error(status: u16, body: String, model: &str) -> LLMError {
    match status {
        401 | 403 => LLMError::AuthenticationFailed,
        429 => LLMError::RateLimitExceeded(body),
        400 => LLMError::InvalidRequest(body),
        404 => LLMError::ModelNotFound(model.to_string()),
        _ => LLMError::RequestFailed(format!("HTTP {status}: {body}")),
    }
}
