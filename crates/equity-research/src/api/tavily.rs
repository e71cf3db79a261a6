//! Tavily search client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

use crate::error::{ResearchError, Result};
use crate::gateway::NewsSearchProvider;
use crate::model::NewsItem;

const PROVIDER: &str = "tavily";
const BASE_URL: &str = "https://api.tavily.com";

pub struct TavilyClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    published_date: Option<String>,
    score: Option<f64>,
}

impl From<SearchResult> for NewsItem {
    fn from(result: SearchResult) -> Self {
        Self {
            title: result.title,
            url: result.url,
            content: result.content,
            published_date: result.published_date,
            score: result.score,
        }
    }
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl NewsSearchProvider for TavilyClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<NewsItem>> {
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&SearchRequest {
                api_key: &self.api_key,
                query,
                search_depth: "advanced",
                max_results,
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ResearchError::Configuration(
                    "Tavily rejected the API key (check TAVILY_API_KEY)".to_string(),
                ));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(ResearchError::RateLimited {
                    provider: PROVIDER.to_string(),
                });
            }
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(ResearchError::provider(PROVIDER, format!("HTTP {status}: {body}")));
            }
            _ => {}
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.results.into_iter().map(NewsItem::from).collect())
    }
}
