//! `get_stock_price`: current quote for a ticker

use async_trait::async_trait;
use research_runtime::{RuntimeError, Tool};
use serde_json::{Value, json};

use super::{GET_STOCK_PRICE, ticker_from, ticker_schema};
use crate::error::Result;
use crate::gateway::MarketDataGateway;
use crate::model::{StockPrice, round2};

#[derive(Clone)]
pub struct QuoteTool {
    gateway: MarketDataGateway,
}

impl QuoteTool {
    pub fn new(gateway: MarketDataGateway) -> Self {
        Self { gateway }
    }

    pub async fn fetch(&self, ticker: &str) -> Result<StockPrice> {
        self.gateway.quote(ticker).await
    }
}

pub(crate) fn quote_json(price: &StockPrice) -> Value {
    json!({
        "symbol": price.symbol,
        "current_price": round2(price.current_price),
        "previous_close": round2(price.previous_close),
        "change_percent": price.change_percent,
        "volume": price.volume,
        "market_cap": price.market_cap,
    })
}

#[async_trait]
impl Tool for QuoteTool {
    async fn execute(&self, params: Value) -> research_runtime::Result<Value> {
        let ticker = ticker_from(GET_STOCK_PRICE, params)?;
        let price = self
            .fetch(&ticker)
            .await
            .map_err(|e| RuntimeError::tool_failed(GET_STOCK_PRICE, e))?;
        Ok(quote_json(&price))
    }

    fn name(&self) -> &str {
        GET_STOCK_PRICE
    }

    fn description(&self) -> &str {
        "Get the current stock quote: price, previous close, day change in percent, \
         volume and market capitalization."
    }

    fn input_schema(&self) -> Value {
        ticker_schema()
    }
}
