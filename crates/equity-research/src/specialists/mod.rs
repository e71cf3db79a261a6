//! Capability-restricted specialist agents
//!
//! A specialist owns typed handles to exactly the tools it is allowed to use
//! and an [`AgentExecutor`] whose [`ToolSet`] holds only those tools. It
//! gathers data deterministically through its handles first, then lets the
//! model analyze (and optionally re-query) within that boundary.

pub mod fundamental;
pub mod sentiment;
pub mod technical;

pub use fundamental::FundamentalAnalyst;
pub use sentiment::SentimentAnalyst;
pub use technical::TechnicalAnalyst;

use async_trait::async_trait;
use research_llm::LLMProvider;
use research_runtime::{AgentExecutor, ExecutorConfig, ToolSet};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ResearchConfig;
use crate::error::Result;
use crate::model::NewsItem;
use crate::prompts::{Prompt, PromptLibrary};
use crate::tools::{GET_FINANCIAL_DATA, GET_STOCK_PRICE, GET_TECHNICAL_SUMMARY, SEARCH_STOCK_NEWS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialistKind {
    Fundamental,
    Technical,
    Sentiment,
}

impl SpecialistKind {
    pub const ALL: [SpecialistKind; 3] = [Self::Fundamental, Self::Technical, Self::Sentiment];

    pub fn name(self) -> &'static str {
        match self {
            Self::Fundamental => "fundamental-analyst",
            Self::Technical => "technical-analyst",
            Self::Sentiment => "sentiment-analyst",
        }
    }

    /// The only tools this specialist may invoke
    pub fn tool_names(self) -> &'static [&'static str] {
        match self {
            Self::Fundamental => &[GET_STOCK_PRICE, GET_FINANCIAL_DATA],
            Self::Technical => &[GET_TECHNICAL_SUMMARY],
            Self::Sentiment => &[SEARCH_STOCK_NEWS],
        }
    }

    fn system_prompt(self) -> Prompt {
        match self {
            Self::Fundamental => Prompt::FundamentalSystem,
            Self::Technical => Prompt::TechnicalSystem,
            Self::Sentiment => Prompt::SentimentSystem,
        }
    }
}

impl fmt::Display for SpecialistKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a specialist hands back to the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistReport {
    pub kind: SpecialistKind,
    pub analysis: String,
    /// Merged into the session's `stock_data`
    pub metrics: BTreeMap<String, Value>,
    pub news: Vec<NewsItem>,
    /// Human-readable notes on data that could not be gathered
    pub gaps: Vec<String>,
}

impl SpecialistReport {
    /// Report for a specialist that never ran
    pub fn skipped(kind: SpecialistKind, reason: &str) -> Self {
        Self {
            kind,
            analysis: format!("{kind} did not run: {reason}."),
            metrics: BTreeMap::new(),
            news: Vec::new(),
            gaps: vec![format!("{kind} skipped: {reason}")],
        }
    }
}

#[async_trait]
pub trait Specialist: Send + Sync {
    fn kind(&self) -> SpecialistKind;

    /// Tools granted to this specialist's agent
    fn tools(&self) -> &ToolSet;

    /// Never fails; problems surface as gaps in the report
    async fn investigate(&self, ticker: &str, objective: &str) -> SpecialistReport;
}

/// The model-facing half shared by all specialists
pub(crate) struct Narrator {
    kind: SpecialistKind,
    executor: AgentExecutor,
    prompts: Arc<PromptLibrary>,
}

impl Narrator {
    pub(crate) fn new(
        kind: SpecialistKind,
        tools: ToolSet,
        provider: Arc<dyn LLMProvider>,
        prompts: Arc<PromptLibrary>,
        config: &ResearchConfig,
    ) -> Result<Self> {
        let executor_config = ExecutorConfig {
            max_turns: config.specialist_max_turns,
            model: config.model().to_string(),
            system_prompt: Some(prompts.render(kind.system_prompt(), json!({}))?),
            max_tokens: config.max_tokens,
            temperature: Some(config.temperature),
        };

        Ok(Self {
            kind,
            executor: AgentExecutor::new(provider, tools, executor_config),
            prompts,
        })
    }

    pub(crate) fn tools(&self) -> &ToolSet {
        self.executor.tools()
    }

    /// Run the tool loop over the gathered data; degrade to a data listing on failure
    pub(crate) async fn narrate(
        &self,
        ticker: &str,
        objective: &str,
        data: &Value,
        gaps: &[String],
    ) -> String {
        let task = self.prompts.render(
            Prompt::SpecialistTask,
            json!({
                "ticker": ticker,
                "objective": objective,
                "data": serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string()),
                "gaps": gaps,
            }),
        );

        let outcome = match task {
            Ok(task) => self.executor.run(task).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        let mut text = match outcome {
            Ok(run) if !run.text.trim().is_empty() => {
                info!(
                    specialist = %self.kind,
                    turns = run.turns,
                    tool_calls = run.tool_calls.len(),
                    truncated = run.truncated,
                    total_tokens = run.usage.total(),
                    "Specialist analysis completed"
                );
                run.text.trim().to_string()
            }
            Ok(_) => degraded(self.kind, "the model returned no text", data),
            Err(reason) => {
                warn!(specialist = %self.kind, error = %reason, "Specialist LLM run failed");
                degraded(self.kind, &reason, data)
            }
        };

        if !gaps.is_empty() {
            text.push_str("\n\nData gaps:\n");
            for gap in gaps {
                text.push_str(&format!("- {gap}\n"));
            }
        }
        text
    }
}

fn degraded(kind: SpecialistKind, reason: &str, data: &Value) -> String {
    let data = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
    format!("{kind} could not produce an analysis ({reason}). Gathered data:\n{data}")
}
