//! `get_technical_summary`: moving averages, RSI and signal

use async_trait::async_trait;
use research_runtime::{RuntimeError, Tool};
use serde_json::{Map, Value, json};

use super::{GET_TECHNICAL_SUMMARY, ticker_from, ticker_schema};
use crate::error::Result;
use crate::gateway::MarketDataGateway;
use crate::model::{TechnicalSummary, round2};

#[derive(Clone)]
pub struct TechnicalSummaryTool {
    gateway: MarketDataGateway,
}

impl TechnicalSummaryTool {
    pub fn new(gateway: MarketDataGateway) -> Self {
        Self { gateway }
    }

    pub async fn fetch(&self, ticker: &str) -> Result<TechnicalSummary> {
        self.gateway.technical_summary(ticker).await
    }
}

/// Overbought above 70, oversold below 30
pub(crate) fn interpret_rsi(rsi: f64) -> &'static str {
    if rsi > 70.0 {
        "overbought"
    } else if rsi < 30.0 {
        "oversold"
    } else {
        "neutral"
    }
}

pub(crate) fn summary_json(summary: &TechnicalSummary) -> Value {
    let moving_averages: Map<String, Value> = summary
        .moving_averages
        .iter()
        .map(|(label, value)| (label.clone(), json!(value.map(round2))))
        .collect();

    json!({
        "current_price": round2(summary.current_price),
        "moving_averages": moving_averages,
        "rsi": round2(summary.rsi),
        "rsi_interpretation": interpret_rsi(summary.rsi),
        "signal": summary.signal,
    })
}

#[async_trait]
impl Tool for TechnicalSummaryTool {
    async fn execute(&self, params: Value) -> research_runtime::Result<Value> {
        let ticker = ticker_from(GET_TECHNICAL_SUMMARY, params)?;
        let summary = self
            .fetch(&ticker)
            .await
            .map_err(|e| RuntimeError::tool_failed(GET_TECHNICAL_SUMMARY, e))?;

        let mut value = summary_json(&summary);
        value["symbol"] = json!(ticker);
        Ok(value)
    }

    fn name(&self) -> &str {
        GET_TECHNICAL_SUMMARY
    }

    fn description(&self) -> &str {
        "Get a technical summary: 20/50/200-day moving averages over one year, \
         14-day RSI over three months and a BUY/SELL/NEUTRAL signal."
    }

    fn input_schema(&self) -> Value {
        ticker_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockMarketDataProvider;
    use crate::testing::market_gateway;
    use crate::ResearchError;

    #[test]
    fn test_interpret_rsi() {
        assert_eq!(interpret_rsi(75.0), "overbought");
        assert_eq!(interpret_rsi(25.0), "oversold");
        assert_eq!(interpret_rsi(70.0), "neutral");
    }

    #[tokio::test]
    async fn test_execute_short_history() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_daily_closes()
            .returning(|_, _| Ok((1..=30).map(f64::from).collect()));
        mock.expect_ticker_info()
            .returning(|t| Err(ResearchError::unavailable(t, "no quote")));

        let tool = TechnicalSummaryTool::new(market_gateway(mock));
        let value = tool.execute(json!({"ticker": "abc"})).await.unwrap();
        assert_eq!(value["symbol"], "ABC");
        assert_eq!(value["current_price"], 30.0);
        assert_eq!(value["moving_averages"]["MA_20"], 20.5);
        assert!(value["moving_averages"]["MA_200"].is_null());
        assert_eq!(value["rsi"], 100.0);
        assert_eq!(value["signal"], "NEUTRAL");
    }
}
