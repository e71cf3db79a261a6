//! `get_financial_data`: fundamental metrics for a ticker

use async_trait::async_trait;
use research_runtime::{RuntimeError, Tool};
use serde_json::{Value, json};

use super::{GET_FINANCIAL_DATA, ticker_from, ticker_schema};
use crate::error::Result;
use crate::gateway::MarketDataGateway;
use crate::model::{FinancialData, round2};

#[derive(Clone)]
pub struct FundamentalsTool {
    gateway: MarketDataGateway,
}

impl FundamentalsTool {
    pub fn new(gateway: MarketDataGateway) -> Self {
        Self { gateway }
    }

    pub async fn fetch(&self, ticker: &str) -> Result<FinancialData> {
        self.gateway.fundamentals(ticker).await
    }
}

pub(crate) fn fundamentals_json(data: &FinancialData) -> Value {
    json!({
        "symbol": data.symbol,
        "revenue": data.revenue,
        "net_income": data.net_income,
        "eps": data.eps.map(round2),
        "pe_ratio": data.pe_ratio.map(round2),
        "debt_to_equity": data.debt_to_equity.map(round2),
        "missing": data.missing_fields(),
    })
}

#[async_trait]
impl Tool for FundamentalsTool {
    async fn execute(&self, params: Value) -> research_runtime::Result<Value> {
        let ticker = ticker_from(GET_FINANCIAL_DATA, params)?;
        let data = self
            .fetch(&ticker)
            .await
            .map_err(|e| RuntimeError::tool_failed(GET_FINANCIAL_DATA, e))?;
        Ok(fundamentals_json(&data))
    }

    fn name(&self) -> &str {
        GET_FINANCIAL_DATA
    }

    fn description(&self) -> &str {
        "Get fundamental metrics: revenue, net income, EPS, P/E ratio and \
         debt-to-equity. Metrics the provider does not report are null."
    }

    fn input_schema(&self) -> Value {
        ticker_schema()
    }
}
