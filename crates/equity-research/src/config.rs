//! Configuration for research runs

use crate::error::{ResearchError, Result};
use research_llm::LLMProvider;
use research_llm::providers::{GeminiConfig, GeminiProvider, OpenAIConfig, OpenAIProvider};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Inference backend used by the orchestrator and the specialists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LlmBackend {
    /// Google Gemini (requires GOOGLE_API_KEY)
    #[default]
    Gemini,
    /// OpenAI or any compatible endpoint (requires OPENAI_API_KEY)
    OpenAi,
}

impl FromStr for LlmBackend {
    type Err = ResearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            other => Err(ResearchError::Configuration(format!(
                "unknown LLM provider '{other}' (expected 'gemini' or 'openai')"
            ))),
        }
    }
}

/// Market data provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataProvider {
    /// Yahoo Finance (default, no API key required)
    #[default]
    Yahoo,
    /// Alpha Vantage (requires API key)
    AlphaVantage,
}

impl FromStr for DataProvider {
    type Err = ResearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "alpha_vantage" | "alphavantage" => Ok(Self::AlphaVantage),
            other => Err(ResearchError::Configuration(format!(
                "unknown market data provider '{other}' (expected 'yahoo' or 'alpha_vantage')"
            ))),
        }
    }
}

/// Settings for a research run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    pub llm_backend: LlmBackend,
    pub gemini_model: String,
    pub openai_model: String,
    /// Override for OpenAI-compatible endpoints
    pub openai_api_base: Option<String>,
    pub google_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub tavily_api_key: Option<String>,

    pub market_provider: DataProvider,
    pub alpha_vantage_api_key: Option<String>,
    /// Alpha Vantage requests per minute
    pub alpha_vantage_rate_limit: u32,

    pub temperature: f32,
    pub max_tokens: usize,

    /// Maximum revision passes
    pub max_iterations: usize,
    /// Step budget; defaults to `(max_iterations + 1) * 10`
    pub max_steps: Option<usize>,
    /// Model turns per specialist run
    pub specialist_max_turns: usize,
    pub news_max_results: usize,

    pub request_timeout: Duration,
    pub cache_ttl_quote: Duration,
    pub cache_ttl_history: Duration,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            llm_backend: LlmBackend::Gemini,
            gemini_model: "gemini-2.0-flash-exp".to_string(),
            openai_model: "gpt-4o".to_string(),
            openai_api_base: None,
            google_api_key: None,
            openai_api_key: None,
            tavily_api_key: None,
            market_provider: DataProvider::Yahoo,
            alpha_vantage_api_key: None,
            alpha_vantage_rate_limit: 5,
            temperature: 0.7,
            max_tokens: 8000,
            max_iterations: 3,
            max_steps: None,
            specialist_max_turns: 5,
            news_max_results: 5,
            request_timeout: Duration::from_secs(30),
            cache_ttl_quote: Duration::from_secs(60),
            cache_ttl_history: Duration::from_secs(300),
        }
    }
}

impl ResearchConfig {
    pub fn builder() -> ResearchConfigBuilder {
        ResearchConfigBuilder::default()
    }

    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Failed to load .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup and validate
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(backend) = var("LLM_PROVIDER") {
            config.llm_backend = backend.parse()?;
        }
        if let Some(provider) = var("MARKET_DATA_PROVIDER") {
            config.market_provider = provider.parse()?;
        }
        if let Some(model) = var("GEMINI_MODEL") {
            config.gemini_model = model;
        }
        if let Some(model) = var("OPENAI_MODEL") {
            config.openai_model = model;
        }
        config.openai_api_base = var("OPENAI_API_BASE");
        config.google_api_key = var("GOOGLE_API_KEY");
        config.openai_api_key = var("OPENAI_API_KEY");
        config.tavily_api_key = var("TAVILY_API_KEY");
        config.alpha_vantage_api_key = var("ALPHA_VANTAGE_API_KEY");

        if let Some(value) = var("TEMPERATURE") {
            config.temperature = parse_number("TEMPERATURE", &value)?;
        }
        if let Some(value) = var("MAX_TOKENS") {
            config.max_tokens = parse_number("MAX_TOKENS", &value)?;
        }
        if let Some(value) = var("MAX_ITERATIONS") {
            config.max_iterations = parse_number("MAX_ITERATIONS", &value)?;
        }
        if let Some(value) = var("MAX_STEPS") {
            config.max_steps = Some(parse_number("MAX_STEPS", &value)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Model name for the selected backend
    pub fn model(&self) -> &str {
        match self.llm_backend {
            LlmBackend::Gemini => &self.gemini_model,
            LlmBackend::OpenAi => &self.openai_model,
        }
    }

    /// Total step budget for one run, enough for every analysis pass by default
    pub fn step_limit(&self) -> usize {
        self.max_steps
            .unwrap_or_else(|| self.max_iterations.saturating_add(1).saturating_mul(10))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        match self.llm_backend {
            LlmBackend::Gemini if self.google_api_key.is_none() => {
                return Err(ResearchError::Configuration(
                    "GOOGLE_API_KEY is required when using the Gemini backend".to_string(),
                ));
            }
            LlmBackend::OpenAi if self.openai_api_key.is_none() => {
                return Err(ResearchError::Configuration(
                    "OPENAI_API_KEY is required when using the OpenAI backend".to_string(),
                ));
            }
            _ => {}
        }

        if self.tavily_api_key.is_none() {
            return Err(ResearchError::Configuration(
                "TAVILY_API_KEY is required for news search".to_string(),
            ));
        }

        if self.market_provider == DataProvider::AlphaVantage
            && self.alpha_vantage_api_key.is_none()
        {
            return Err(ResearchError::Configuration(
                "ALPHA_VANTAGE_API_KEY is required when using the Alpha Vantage provider"
                    .to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ResearchError::Configuration(format!(
                "temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }

        if self.max_tokens == 0 {
            return Err(ResearchError::Configuration(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.step_limit() == 0 {
            return Err(ResearchError::Configuration(
                "the step budget must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| ResearchError::Configuration(format!("{key} has an invalid value '{value}'")))
}

/// Construct the inference backend selected by `config`
pub fn build_llm_provider(config: &ResearchConfig) -> Result<Arc<dyn LLMProvider>> {
    let timeout_secs = config.request_timeout.as_secs().max(1) * 4;

    match config.llm_backend {
        LlmBackend::Gemini => {
            let key = config.google_api_key.clone().ok_or_else(|| {
                ResearchError::Configuration("GOOGLE_API_KEY is not set".to_string())
            })?;
            let provider =
                GeminiProvider::with_config(GeminiConfig::new(key).with_timeout(timeout_secs))?;
            Ok(Arc::new(provider))
        }
        LlmBackend::OpenAi => {
            let key = config.openai_api_key.clone().ok_or_else(|| {
                ResearchError::Configuration("OPENAI_API_KEY is not set".to_string())
            })?;
            let mut openai = OpenAIConfig::new(key).with_timeout(timeout_secs);
            if let Some(base) = &config.openai_api_base {
                openai = openai.with_api_base(base.clone());
            }
            Ok(Arc::new(OpenAIProvider::with_config(openai)?))
        }
    }
}

/// Builder for ResearchConfig
#[derive(Debug, Default)]
pub struct ResearchConfigBuilder {
    config: ResearchConfig,
}

impl ResearchConfigBuilder {
    pub fn llm_backend(mut self, backend: LlmBackend) -> Self {
        self.config.llm_backend = backend;
        self
    }

    pub fn gemini_model(mut self, model: impl Into<String>) -> Self {
        self.config.gemini_model = model.into();
        self
    }

    pub fn openai_model(mut self, model: impl Into<String>) -> Self {
        self.config.openai_model = model.into();
        self
    }

    pub fn openai_api_base(mut self, base: impl Into<String>) -> Self {
        self.config.openai_api_base = Some(base.into());
        self
    }

    pub fn google_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.google_api_key = Some(key.into());
        self
    }

    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.openai_api_key = Some(key.into());
        self
    }

    pub fn tavily_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.tavily_api_key = Some(key.into());
        self
    }

    pub fn market_provider(mut self, provider: DataProvider) -> Self {
        self.config.market_provider = provider;
        self
    }

    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.alpha_vantage_api_key = Some(key.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.config.max_steps = Some(max_steps);
        self
    }

    pub fn specialist_max_turns(mut self, turns: usize) -> Self {
        self.config.specialist_max_turns = turns;
        self
    }

    pub fn news_max_results(mut self, max_results: usize) -> Self {
        self.config.news_max_results = max_results;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ResearchConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ResearchConfig::default();
        assert_eq!(config.llm_backend, LlmBackend::Gemini);
        assert_eq!(config.model(), "gemini-2.0-flash-exp");
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.step_limit(), 40);
        assert_eq!(config.market_provider, DataProvider::Yahoo);
    }

    #[test]
    fn test_from_lookup() {
        let config = ResearchConfig::from_lookup(lookup(&[
            ("LLM_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("TAVILY_API_KEY", "tvly-test"),
            ("MAX_ITERATIONS", "2"),
            ("TEMPERATURE", "0.2"),
        ]))
        .unwrap();

        assert_eq!(config.llm_backend, LlmBackend::OpenAi);
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.max_iterations, 2);
        assert_eq!(config.step_limit(), 30);
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_llm_key_fails_fast() {
        let err = ResearchConfig::from_lookup(lookup(&[("TAVILY_API_KEY", "tvly-test")]))
            .unwrap_err();
        assert!(matches!(err, ResearchError::Configuration(ref msg) if msg.contains("GOOGLE_API_KEY")));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_tavily_key_fails_fast() {
        let err = ResearchConfig::from_lookup(lookup(&[("GOOGLE_API_KEY", "g-test")])).unwrap_err();
        assert!(matches!(err, ResearchError::Configuration(ref msg) if msg.contains("TAVILY_API_KEY")));
    }

    #[test]
    fn test_unknown_provider_name() {
        let err = ResearchConfig::from_lookup(lookup(&[
            ("LLM_PROVIDER", "llama"),
            ("GOOGLE_API_KEY", "g-test"),
            ("TAVILY_API_KEY", "tvly-test"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ResearchError::Configuration(_)));

        assert!("bloomberg".parse::<DataProvider>().is_err());
        assert_eq!("Alpha_Vantage".parse::<DataProvider>().unwrap(), DataProvider::AlphaVantage);
    }

    #[test]
    fn test_alpha_vantage_requires_key() {
        let result = ResearchConfig::builder()
            .google_api_key("g")
            .tavily_api_key("t")
            .market_provider(DataProvider::AlphaVantage)
            .build();
        assert!(result.is_err());

        let config = ResearchConfig::builder()
            .google_api_key("g")
            .tavily_api_key("t")
            .market_provider(DataProvider::AlphaVantage)
            .alpha_vantage_api_key("av")
            .build()
            .unwrap();
        assert_eq!(config.market_provider, DataProvider::AlphaVantage);
    }

    #[test]
    fn test_invalid_numbers() {
        let base = ResearchConfig::builder().google_api_key("g").tavily_api_key("t");
        assert!(base.temperature(3.5).build().is_err());

        let base = ResearchConfig::builder().google_api_key("g").tavily_api_key("t");
        assert!(base.max_steps(0).build().is_err());

        let err = ResearchConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g"),
            ("TAVILY_API_KEY", "t"),
            ("MAX_TOKENS", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[test]
    fn test_zero_iterations_still_budgets_one_pass() {
        let config = ResearchConfig::builder()
            .google_api_key("g")
            .tavily_api_key("t")
            .max_iterations(0)
            .build()
            .unwrap();
        assert_eq!(config.max_iterations, 0);
        assert_eq!(config.step_limit(), 10);

        let config = ResearchConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g"),
            ("TAVILY_API_KEY", "t"),
            ("MAX_ITERATIONS", "0"),
            ("MAX_STEPS", "7"),
        ]))
        .unwrap();
        assert_eq!(config.step_limit(), 7);
    }

    #[test]
    fn test_build_llm_provider() {
        let config = ResearchConfig::builder()
            .llm_backend(LlmBackend::OpenAi)
            .openai_api_key("sk-test")
            .openai_api_base("http://localhost:8080/v1/")
            .tavily_api_key("t")
            .build()
            .unwrap();
        let provider = build_llm_provider(&config).unwrap();
        assert_eq!(provider.name(), "openai");
    }
}
