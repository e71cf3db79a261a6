//! Error types for research operations

use research_llm::LLMError;
use research_runtime::RuntimeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResearchError {
    /// The provider has no usable record for the ticker
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Indicator math could not produce a result
    #[error("Computation error: {0}")]
    Computation(String),

    /// Transient network or API failure
    #[error("{provider} fault: {message}")]
    ProviderFault { provider: String, message: String },

    #[error("Rate limit exceeded for {provider}")]
    RateLimited { provider: String },

    /// Missing credentials or invalid settings; fatal before orchestration
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid ticker: {0:?}")]
    InvalidTicker(String),

    #[error(transparent)]
    Llm(#[from] LLMError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ResearchError>;

impl ResearchError {
    pub fn unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::ProviderFault {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    /// Errors that must stop the run instead of degrading it
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::InvalidTicker(_))
    }
}

impl From<reqwest::Error> for ResearchError {
    fn from(err: reqwest::Error) -> Self {
        Self::provider("http", err)
    }
}

impl From<minijinja::Error> for ResearchError {
    fn from(err: minijinja::Error) -> Self {
        Self::Prompt(err.to_string())
    }
}

/// Tools surface research errors to the model as tool failures
impl From<ResearchError> for RuntimeError {
    fn from(err: ResearchError) -> Self {
        match err {
            ResearchError::Runtime(inner) => inner,
            other => RuntimeError::ToolFailed {
                name: "research".to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ResearchError::unavailable("UNKNOWN", "no quote record");
        assert_eq!(err.to_string(), "Data not available for UNKNOWN: no quote record");

        let err = ResearchError::provider("tavily", "HTTP 503");
        assert_eq!(err.to_string(), "tavily fault: HTTP 503");
    }

    #[test]
    fn test_fatal_classification() {
        assert!(ResearchError::Configuration("missing key".into()).is_fatal());
        assert!(ResearchError::InvalidTicker(String::new()).is_fatal());
        assert!(!ResearchError::unavailable("X", "y").is_fatal());
        assert!(!ResearchError::Computation("empty".into()).is_fatal());
    }

    #[test]
    fn test_conversion_to_runtime_error() {
        let runtime: RuntimeError = ResearchError::unavailable("ZZZZ", "unknown ticker").into();
        match runtime {
            RuntimeError::ToolFailed { message, .. } => assert!(message.contains("ZZZZ")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
