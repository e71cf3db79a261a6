//! Tools exposed to the specialist agents
//!
//! Each tool wraps one gateway operation. The typed `fetch` methods are used
//! directly by the specialists; the [`research_runtime::Tool`] impls serve the
//! model's tool calls.

pub mod fundamentals;
pub mod news;
pub mod quote;
pub mod technical;

pub use fundamentals::FundamentalsTool;
pub use news::NewsSearchTool;
pub use quote::QuoteTool;
pub use technical::TechnicalSummaryTool;

use research_runtime::RuntimeError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const GET_STOCK_PRICE: &str = "get_stock_price";
pub const GET_FINANCIAL_DATA: &str = "get_financial_data";
pub const GET_TECHNICAL_SUMMARY: &str = "get_technical_summary";
pub const SEARCH_STOCK_NEWS: &str = "search_stock_news";

/// Input shared by the ticker-only tools
#[derive(Debug, Deserialize)]
struct TickerParams {
    ticker: String,
}

fn parse_params<T: DeserializeOwned>(tool: &str, params: Value) -> Result<T, RuntimeError> {
    serde_json::from_value(params).map_err(|e| RuntimeError::InvalidInput {
        name: tool.to_string(),
        message: e.to_string(),
    })
}

/// Trim and upper-case; reject blanks
fn normalize_ticker(tool: &str, raw: &str) -> Result<String, RuntimeError> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(RuntimeError::InvalidInput {
            name: tool.to_string(),
            message: "ticker must not be empty".to_string(),
        });
    }
    Ok(ticker)
}

fn ticker_from(tool: &str, params: Value) -> Result<String, RuntimeError> {
    let params: TickerParams = parse_params(tool, params)?;
    normalize_ticker(tool, &params.ticker)
}

fn ticker_schema() -> Value {
    research_llm::tools::schema::object(
        serde_json::json!({
            "ticker": research_llm::tools::schema::string("Stock ticker symbol, e.g. 'AAPL'"),
        }),
        &["ticker"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ticker_from_normalizes() {
        assert_eq!(ticker_from("t", json!({"ticker": " aapl "})).unwrap(), "AAPL");
    }

    #[test]
    fn test_ticker_from_rejects_bad_input() {
        assert!(matches!(
            ticker_from("t", json!({"symbol": "AAPL"})),
            Err(RuntimeError::InvalidInput { .. })
        ));
        assert!(matches!(
            ticker_from("t", json!({"ticker": "   "})),
            Err(RuntimeError::InvalidInput { .. })
        ));
    }
}
