//! fundamental-analyst: quote and financial data

use async_trait::async_trait;
use research_llm::LLMProvider;
use research_runtime::{Tool, ToolSet};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{instrument, warn};

use super::{Narrator, Specialist, SpecialistKind, SpecialistReport};
use crate::config::ResearchConfig;
use crate::error::Result;
use crate::prompts::PromptLibrary;
use crate::tools::fundamentals::fundamentals_json;
use crate::tools::quote::quote_json;
use crate::tools::{FundamentalsTool, QuoteTool};

pub struct FundamentalAnalyst {
    quote: QuoteTool,
    fundamentals: FundamentalsTool,
    narrator: Narrator,
}

impl FundamentalAnalyst {
    pub fn new(
        quote: QuoteTool,
        fundamentals: FundamentalsTool,
        provider: Arc<dyn LLMProvider>,
        prompts: Arc<PromptLibrary>,
        config: &ResearchConfig,
    ) -> Result<Self> {
        let tools = ToolSet::new([
            Arc::new(quote.clone()) as Arc<dyn Tool>,
            Arc::new(fundamentals.clone()) as Arc<dyn Tool>,
        ])?;

        Ok(Self {
            quote,
            fundamentals,
            narrator: Narrator::new(SpecialistKind::Fundamental, tools, provider, prompts, config)?,
        })
    }
}

#[async_trait]
impl Specialist for FundamentalAnalyst {
    fn kind(&self) -> SpecialistKind {
        SpecialistKind::Fundamental
    }

    fn tools(&self) -> &ToolSet {
        self.narrator.tools()
    }

    #[instrument(skip(self, objective), fields(specialist = "fundamental-analyst"))]
    async fn investigate(&self, ticker: &str, objective: &str) -> SpecialistReport {
        let mut metrics = BTreeMap::new();
        let mut gaps = Vec::new();

        let (quote, fundamentals) =
            tokio::join!(self.quote.fetch(ticker), self.fundamentals.fetch(ticker));

        match quote {
            Ok(price) => {
                metrics.insert("quote".to_string(), quote_json(&price));
            }
            Err(e) => {
                warn!(ticker, error = %e, "Price data unavailable");
                gaps.push(format!("price data unavailable for {ticker}: {e}"));
            }
        }

        match fundamentals {
            Ok(data) => {
                let missing = data.missing_fields();
                if !missing.is_empty() {
                    gaps.push(format!(
                        "financial metrics not reported for {ticker}: {}",
                        missing.join(", ")
                    ));
                }
                metrics.insert("fundamentals".to_string(), fundamentals_json(&data));
            }
            Err(e) => {
                warn!(ticker, error = %e, "Financial data unavailable");
                gaps.push(format!("financial data unavailable for {ticker}: {e}"));
            }
        }

        let data = Value::Object(metrics.clone().into_iter().collect());
        let analysis = self.narrator.narrate(ticker, objective, &data, &gaps).await;

        SpecialistReport {
            kind: SpecialistKind::Fundamental,
            analysis,
            metrics,
            news: Vec::new(),
            gaps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MockMarketDataProvider, TickerInfo};
    use crate::testing::{ScriptedLlm, first_user_text, market_gateway, test_config};

    fn analyst(mock: MockMarketDataProvider, llm: Arc<ScriptedLlm>) -> FundamentalAnalyst {
        let gateway = market_gateway(mock);
        FundamentalAnalyst::new(
            QuoteTool::new(gateway.clone()),
            FundamentalsTool::new(gateway),
            llm,
            Arc::new(PromptLibrary::new().unwrap()),
            &test_config(),
        )
        .unwrap()
    }

    #[test]
    fn test_granted_tools() {
        let analyst = analyst(MockMarketDataProvider::new(), ScriptedLlm::constant("ok"));
        assert_eq!(analyst.tools().names(), vec!["get_financial_data", "get_stock_price"]);
    }

    #[tokio::test]
    async fn test_investigate_collects_metrics() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_ticker_info().returning(|_| {
            Ok(TickerInfo {
                current_price: Some(410.0),
                previous_close: Some(400.0),
                volume: Some(20_000_000),
                total_revenue: Some(2.45e11),
                net_income_to_common: Some(8.8e10),
                trailing_eps: Some(11.8),
                trailing_pe: Some(34.7),
                debt_to_equity: Some(33.0),
                ..TickerInfo::default()
            })
        });
        let llm = ScriptedLlm::constant("MSFT trades at 34.7x earnings.");

        let report = analyst(mock, llm.clone()).investigate("MSFT", "valuation").await;
        assert_eq!(report.kind, SpecialistKind::Fundamental);
        assert_eq!(report.analysis, "MSFT trades at 34.7x earnings.");
        assert!(report.gaps.is_empty());
        assert_eq!(report.metrics["quote"]["change_percent"], 2.5);
        assert_eq!(report.metrics["fundamentals"]["eps"], 11.8);

        let prompt = first_user_text(&llm.requests()[0]);
        assert!(prompt.contains("Objective: valuation"));
        assert!(prompt.contains("\"current_price\": 410.0"));
    }

    #[tokio::test]
    async fn test_unknown_ticker_is_noted_as_gap() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_ticker_info()
            .returning(|t| Err(crate::ResearchError::unavailable(t, "no quote record")));
        let llm = ScriptedLlm::constant("No data could be retrieved for UNKNOWN.");

        let report = analyst(mock, llm).investigate("UNKNOWN", "valuation").await;
        assert!(report.metrics.is_empty());
        assert!(report.gaps[0].starts_with("price data unavailable for UNKNOWN"));
        assert!(report.gaps[1].starts_with("financial data unavailable for UNKNOWN"));
        assert!(report.analysis.contains("Data gaps:\n- price data unavailable for UNKNOWN"));
    }

    #[tokio::test]
    async fn test_llm_failure_degrades() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_ticker_info().returning(|_| {
            Ok(TickerInfo {
                current_price: Some(12.0),
                trailing_eps: Some(0.5),
                ..TickerInfo::default()
            })
        });

        let report = analyst(mock, ScriptedLlm::failing()).investigate("SMOL", "").await;
        assert!(report.analysis.starts_with("fundamental-analyst could not produce an analysis"));
        assert!(report.analysis.contains("\"eps\": 0.5"));
        assert!(report.gaps[0].contains("revenue, net_income, pe_ratio, debt_to_equity"));
    }
}
