//! technical-analyst: moving averages, RSI and signal

use async_trait::async_trait;
use research_llm::LLMProvider;
use research_runtime::{Tool, ToolSet};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{instrument, warn};

use super::{Narrator, Specialist, SpecialistKind, SpecialistReport};
use crate::config::ResearchConfig;
use crate::error::Result;
use crate::indicators::DEFAULT_MA_PERIODS;
use crate::prompts::PromptLibrary;
use crate::tools::TechnicalSummaryTool;
use crate::tools::technical::summary_json;

pub struct TechnicalAnalyst {
    technical: TechnicalSummaryTool,
    narrator: Narrator,
}

impl TechnicalAnalyst {
    pub fn new(
        technical: TechnicalSummaryTool,
        provider: Arc<dyn LLMProvider>,
        prompts: Arc<PromptLibrary>,
        config: &ResearchConfig,
    ) -> Result<Self> {
        let tools = ToolSet::new([Arc::new(technical.clone()) as Arc<dyn Tool>])?;
        Ok(Self {
            technical,
            narrator: Narrator::new(SpecialistKind::Technical, tools, provider, prompts, config)?,
        })
    }
}

#[async_trait]
impl Specialist for TechnicalAnalyst {
    fn kind(&self) -> SpecialistKind {
        SpecialistKind::Technical
    }

    fn tools(&self) -> &ToolSet {
        self.narrator.tools()
    }

    #[instrument(skip(self, objective), fields(specialist = "technical-analyst"))]
    async fn investigate(&self, ticker: &str, objective: &str) -> SpecialistReport {
        let mut metrics = BTreeMap::new();
        let mut gaps = Vec::new();

        match self.technical.fetch(ticker).await {
            Ok(summary) => {
                let short: Vec<String> = DEFAULT_MA_PERIODS
                    .iter()
                    .filter(|&&p| summary.ma(p).is_none())
                    .map(|p| format!("MA_{p}"))
                    .collect();
                if !short.is_empty() {
                    gaps.push(format!(
                        "price history too short for {} on {ticker}",
                        short.join(", ")
                    ));
                }
                metrics.insert("technical".to_string(), summary_json(&summary));
                metrics.insert("signal".to_string(), json!(summary.signal));
            }
            Err(e) => {
                warn!(ticker, error = %e, "Technical data unavailable");
                gaps.push(format!("technical data unavailable for {ticker}: {e}"));
            }
        }

        let data = Value::Object(metrics.clone().into_iter().collect());
        let analysis = self.narrator.narrate(ticker, objective, &data, &gaps).await;

        SpecialistReport {
            kind: SpecialistKind::Technical,
            analysis,
            metrics,
            news: Vec::new(),
            gaps,
        }
    }
}
