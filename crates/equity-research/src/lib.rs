//! Multi-agent equity research
//!
//! A [`ResearchOrchestrator`] runs one research cycle per ticker:
//!
//! - **Planning**: the orchestrator LLM writes a delegation plan
//! - **Gathering**: three capability-restricted specialists run concurrently
//!   - [`FundamentalAnalyst`]: `get_stock_price`, `get_financial_data`
//!   - [`TechnicalAnalyst`]: `get_technical_summary`
//!   - [`SentimentAnalyst`]: `search_stock_news`
//! - **Analyzing / Critiquing**: a unified draft is reviewed and, within
//!   `max_iterations`, revised
//! - **Finalizing**: a [`ResearchReport`] with recommendation, risks and
//!   confidence
//!
//! Market data comes from Yahoo Finance or Alpha Vantage through the
//! [`MarketDataGateway`]; news comes from Tavily through the [`NewsGateway`].
//! Indicators (moving averages, RSI, the trade signal) live in [`indicators`].
//!
//! # Example
//!
//! ```no_run
//! use equity_research::{ResearchConfig, ResearchOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ResearchConfig::from_env()?;
//!     let orchestrator = ResearchOrchestrator::from_config(&config)?;
//!
//!     let report = orchestrator.run("NVDA").await?;
//!     println!("{}", report.to_markdown());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod indicators;
pub mod model;
pub mod orchestrator;
pub mod prompts;
pub mod specialists;
pub mod tools;

#[cfg(test)]
mod testing;

pub use config::{DataProvider, LlmBackend, ResearchConfig, ResearchConfigBuilder};
pub use error::{ResearchError, Result};
pub use gateway::{MarketDataGateway, MarketDataProvider, NewsGateway, NewsSearchProvider};
pub use model::{FinancialData, NewsItem, ResearchReport, Signal, StockPrice, TechnicalSummary};
pub use orchestrator::{
    CompletenessPolicy, CritiqueVerdictPolicy, ResearchOrchestrator, ResearchOrchestratorBuilder,
    ResearchPhase, ResearchSession, RevisionPolicy,
};
pub use specialists::{
    FundamentalAnalyst, SentimentAnalyst, Specialist, SpecialistKind, SpecialistReport,
    TechnicalAnalyst,
};
