//! Agent executor: the model → tool calls → results → model loop
//!
//! The executor only dispatches tools present in its [`ToolSet`]. A call to
//! any other tool is answered with an error tool result and never executed.

use crate::{Result, ToolSet};
use research_llm::{CompletionRequest, LLMProvider, Message, StopReason, TokenUsage};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a careful equity research assistant.";

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum model turns per run
    pub max_turns: usize,
    pub model: String,
    pub system_prompt: Option<String>,
    pub max_tokens: usize,
    pub temperature: Option<f32>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_turns: 5,
            model: "gemini-2.0-flash-exp".to_string(),
            system_prompt: None,
            max_tokens: 8000,
            temperature: Some(0.7),
        }
    }
}

/// One tool invocation requested by the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRecord {
    pub name: String,
    pub input: Value,
    /// False when the tool failed or was not permitted
    pub succeeded: bool,
    pub permitted: bool,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub text: String,
    pub turns: usize,
    pub tool_calls: Vec<ToolCallRecord>,
    /// True when the run hit `max_turns` or the last reply was cut at `max_tokens`
    pub truncated: bool,
    /// Summed over every model call in the run
    pub usage: TokenUsage,
}

pub struct AgentExecutor {
    provider: Arc<dyn LLMProvider>,
    tools: ToolSet,
    config: ExecutorConfig,
}

impl AgentExecutor {
    pub fn new(provider: Arc<dyn LLMProvider>, tools: ToolSet, config: ExecutorConfig) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run the loop for a single user message
    pub async fn run(&self, user_message: impl Into<String>) -> Result<AgentRun> {
        self.run_conversation(vec![Message::user(user_message)]).await
    }

    pub async fn run_conversation(&self, mut conversation: Vec<Message>) -> Result<AgentRun> {
        let definitions = self.tools.definitions();
        let mut tool_calls = Vec::new();
        let mut last_text = String::new();
        let mut usage = TokenUsage::default();

        for turn in 1..=self.config.max_turns {
            debug!(
                turn,
                max_turns = self.config.max_turns,
                tool_count = definitions.len(),
                "Agent turn started"
            );

            let request = CompletionRequest::builder(&self.config.model)
                .messages(conversation.clone())
                .system(
                    self.config
                        .system_prompt
                        .as_deref()
                        .unwrap_or(DEFAULT_SYSTEM_PROMPT),
                )
                .max_tokens(self.config.max_tokens)
                .maybe_temperature(self.config.temperature)
                .tools(definitions.clone())
                .build();

            let response = self.provider.complete(request).await?;
            usage += response.usage;
            info!(
                turn,
                provider = self.provider.name(),
                stop_reason = ?response.stop_reason,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "LLM response received"
            );

            if let Some(text) = response.message.text() {
                last_text = text;
            }
            conversation.push(response.message.clone());

            match response.stop_reason {
                StopReason::ToolUse if response.message.has_tool_uses() => {
                    let results = self.execute_tools(&response.message, &mut tool_calls).await;
                    conversation.extend(results);
                }
                stop_reason => {
                    let truncated = stop_reason == StopReason::MaxTokens;
                    if truncated {
                        warn!(turn, "Response truncated at max tokens");
                    }
                    return Ok(AgentRun {
                        text: last_text,
                        turns: turn,
                        tool_calls,
                        truncated,
                        usage,
                    });
                }
            }
        }

        warn!(max_turns = self.config.max_turns, "Max turns reached, returning last text");
        Ok(AgentRun {
            text: last_text,
            turns: self.config.max_turns,
            tool_calls,
            truncated: true,
            usage,
        })
    }

    async fn execute_tools(
        &self,
        message: &Message,
        records: &mut Vec<ToolCallRecord>,
    ) -> Vec<Message> {
        let mut results = Vec::new();

        for (id, name, input) in message.tool_uses() {
            let Some(tool) = self.tools.get(name) else {
                warn!(tool_name = %name, "Model requested a tool outside its capability set");
                records.push(ToolCallRecord {
                    name: name.to_string(),
                    input: input.clone(),
                    succeeded: false,
                    permitted: false,
                });
                results.push(Message::tool_error(
                    id,
                    format!("Error: tool '{name}' is not permitted for this agent"),
                ));
                continue;
            };

            let started = Instant::now();
            let outcome = tool.execute(input.clone()).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(value) => {
                    info!(tool_name = %name, duration_ms, "Tool execution succeeded");
                    records.push(ToolCallRecord {
                        name: name.to_string(),
                        input: input.clone(),
                        succeeded: true,
                        permitted: true,
                    });
                    results.push(Message::tool_result(id, value.to_string()));
                }
                Err(e) => {
                    warn!(tool_name = %name, duration_ms, error = %e, "Tool execution failed");
                    records.push(ToolCallRecord {
                        name: name.to_string(),
                        input: input.clone(),
                        succeeded: false,
                        permitted: true,
                    });
                    results.push(Message::tool_error(id, format!("Error: {e}")));
                }
            }
        }

        results
    }
}
