//! sentiment-analyst: news flow

use async_trait::async_trait;
use research_llm::LLMProvider;
use research_runtime::{Tool, ToolSet};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::{Narrator, Specialist, SpecialistKind, SpecialistReport};
use crate::config::ResearchConfig;
use crate::error::Result;
use crate::prompts::PromptLibrary;
use crate::tools::NewsSearchTool;
use crate::tools::news::news_json;

pub struct SentimentAnalyst {
    news: NewsSearchTool,
    narrator: Narrator,
}

impl SentimentAnalyst {
    pub fn new(
        news: NewsSearchTool,
        provider: Arc<dyn LLMProvider>,
        prompts: Arc<PromptLibrary>,
        config: &ResearchConfig,
    ) -> Result<Self> {
        let tools = ToolSet::new([Arc::new(news.clone()) as Arc<dyn Tool>])?;
        Ok(Self {
            news,
            narrator: Narrator::new(SpecialistKind::Sentiment, tools, provider, prompts, config)?,
        })
    }
}

#[async_trait]
impl Specialist for SentimentAnalyst {
    fn kind(&self) -> SpecialistKind {
        SpecialistKind::Sentiment
    }

    fn tools(&self) -> &ToolSet {
        self.narrator.tools()
    }

    #[instrument(skip(self, objective), fields(specialist = "sentiment-analyst"))]
    async fn investigate(&self, ticker: &str, objective: &str) -> SpecialistReport {
        let mut metrics = BTreeMap::new();
        let mut gaps = Vec::new();

        let news = match self.news.fetch(ticker, "").await {
            Ok(items) => {
                if items.is_empty() {
                    debug!(ticker, "No news found");
                }
                metrics.insert("news_count".to_string(), json!(items.len()));
                items
            }
            Err(e) => {
                warn!(ticker, error = %e, "News unavailable");
                gaps.push(format!("news unavailable for {ticker}: {e}"));
                Vec::new()
            }
        };

        let mut data = Value::Object(metrics.clone().into_iter().collect());
        data["news"] = news_json(ticker, &news);
        let analysis = self.narrator.narrate(ticker, objective, &data, &gaps).await;

        SpecialistReport {
            kind: SpecialistKind::Sentiment,
            analysis,
            metrics,
            news,
            gaps,
        }
    }
}
