//! `search_stock_news`: recent news for a ticker

use async_trait::async_trait;
use research_llm::tools::schema;
use research_runtime::{RuntimeError, Tool};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{SEARCH_STOCK_NEWS, normalize_ticker, parse_params};
use crate::error::Result;
use crate::gateway::NewsGateway;
use crate::model::NewsItem;

/// Snippet length forwarded to the model
const SNIPPET_CHARS: usize = 300;

#[derive(Clone)]
pub struct NewsSearchTool {
    gateway: NewsGateway,
    default_max_results: usize,
}

#[derive(Debug, Deserialize)]
struct NewsParams {
    ticker: String,
    #[serde(default)]
    query: String,
    max_results: Option<usize>,
}

impl NewsSearchTool {
    pub fn new(gateway: NewsGateway, default_max_results: usize) -> Self {
        Self {
            gateway,
            default_max_results,
        }
    }

    pub async fn fetch(&self, ticker: &str, query: &str) -> Result<Vec<NewsItem>> {
        self.gateway
            .search_news(ticker, query, self.default_max_results)
            .await
    }
}

pub(crate) fn news_json(ticker: &str, items: &[NewsItem]) -> Value {
    let articles: Vec<Value> = items
        .iter()
        .map(|item| {
            json!({
                "title": item.title,
                "url": item.url,
                "content": item.content.chars().take(SNIPPET_CHARS).collect::<String>(),
                "published_date": item.published_date,
                "score": item.score,
            })
        })
        .collect();

    json!({
        "ticker": ticker,
        "count": articles.len(),
        "articles": articles,
    })
}

#[async_trait]
impl Tool for NewsSearchTool {
    async fn execute(&self, params: Value) -> research_runtime::Result<Value> {
        let params: NewsParams = parse_params(SEARCH_STOCK_NEWS, params)?;
        let ticker = normalize_ticker(SEARCH_STOCK_NEWS, &params.ticker)?;
        let max_results = params
            .max_results
            .unwrap_or(self.default_max_results)
            .clamp(1, 20);

        let items = self
            .gateway
            .search_news(&ticker, &params.query, max_results)
            .await
            .map_err(|e| RuntimeError::tool_failed(SEARCH_STOCK_NEWS, e))?;
        Ok(news_json(&ticker, &items))
    }

    fn name(&self) -> &str {
        SEARCH_STOCK_NEWS
    }

    fn description(&self) -> &str {
        "Search recent news about a stock. An optional topic narrows the search \
         (e.g. 'earnings', 'lawsuit'). Results are ordered by relevance."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "ticker": schema::string("Stock ticker symbol, e.g. 'AAPL'"),
                "query": schema::string("Optional topic to narrow the search"),
                "max_results": schema::integer("Number of articles (default 5)"),
            }),
            &["ticker"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockNewsSearchProvider;
    use crate::testing::news_item;
    use mockall::predicate::eq;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_execute_with_topic() {
        let mut mock = MockNewsSearchProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_search()
            .with(eq("NVDA export rules stock news"), eq(2_usize))
            .returning(|_, _| Ok(vec![news_item("Chip curbs widen")]));

        let tool = NewsSearchTool::new(NewsGateway::new(Arc::new(mock)), 5);
        let value = tool
            .execute(json!({"ticker": "nvda", "query": "export rules", "max_results": 2}))
            .await
            .unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["articles"][0]["title"], "Chip curbs widen");
    }

    #[tokio::test]
    async fn test_empty_results() {
        let mut mock = MockNewsSearchProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_search().returning(|_, _| Ok(Vec::new()));

        let tool = NewsSearchTool::new(NewsGateway::new(Arc::new(mock)), 5);
        let items = tool.fetch("ZZZZ", "").await.unwrap();
        assert!(items.is_empty());
        assert_eq!(news_json("ZZZZ", &items)["count"], 0);
    }
}
