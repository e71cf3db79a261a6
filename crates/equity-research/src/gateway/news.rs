//! News gateway over a search provider

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::api::TavilyClient;
use crate::config::ResearchConfig;
use crate::error::{ResearchError, Result};
use crate::model::NewsItem;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Ranked results in provider order
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<NewsItem>>;
}

#[derive(Clone)]
pub struct NewsGateway {
    provider: Arc<dyn NewsSearchProvider>,
}

impl NewsGateway {
    pub fn new(provider: Arc<dyn NewsSearchProvider>) -> Self {
        Self { provider }
    }

    pub fn from_config(config: &ResearchConfig) -> Result<Self> {
        let key = config.tavily_api_key.clone().ok_or_else(|| {
            ResearchError::Configuration("TAVILY_API_KEY is not set".to_string())
        })?;
        Ok(Self::new(Arc::new(TavilyClient::new(key, config.request_timeout)?)))
    }

    /// `"{ticker} stock news"`, or `"{ticker} {query} stock news"` with a topic
    pub fn build_query(ticker: &str, query: &str) -> String {
        let query = query.trim();
        if query.is_empty() {
            format!("{ticker} stock news")
        } else {
            format!("{ticker} {query} stock news")
        }
    }

    /// One provider call; an empty result is not an error
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn search_news(
        &self,
        ticker: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<NewsItem>> {
        let search = Self::build_query(ticker, query);
        let items = self.provider.search(&search, max_results).await?;
        debug!(count = items.len(), "News search completed");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn item(title: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            url: format!("https://news.example/{title}"),
            content: String::new(),
            published_date: None,
            score: None,
        }
    }

    #[test]
    fn test_build_query() {
        assert_eq!(NewsGateway::build_query("AAPL", ""), "AAPL stock news");
        assert_eq!(NewsGateway::build_query("AAPL", "  "), "AAPL stock news");
        assert_eq!(NewsGateway::build_query("AAPL", "earnings"), "AAPL earnings stock news");
    }

    #[tokio::test]
    async fn test_search_news_passes_query_and_keeps_order() {
        let mut mock = MockNewsSearchProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_search()
            .with(eq("TSLA recall stock news"), eq(3_usize))
            .times(1)
            .returning(|_, _| Ok(vec![item("c"), item("a"), item("b")]));

        let gateway = NewsGateway::new(Arc::new(mock));
        let items = gateway.search_news("TSLA", "recall", 3).await.unwrap();
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_search_is_empty_vec() {
        let mut mock = MockNewsSearchProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_search().returning(|_, _| Ok(Vec::new()));

        let gateway = NewsGateway::new(Arc::new(mock));
        assert!(gateway.search_news("ZZZZ", "", 5).await.unwrap().is_empty());
    }
}
