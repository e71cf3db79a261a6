//! Shared fixtures for unit tests

use async_trait::async_trait;
use research_llm::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message,
    StopReason, TokenUsage,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::config::ResearchConfig;
use crate::gateway::{MarketDataGateway, MockMarketDataProvider};
use crate::model::NewsItem;

type Responder = dyn Fn(&CompletionRequest) -> Result<CompletionResponse, LLMError> + Send + Sync;

/// LLM double driven by a closure; records every request
pub struct ScriptedLlm {
    responder: Box<Responder>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&CompletionRequest) -> Result<CompletionResponse, LLMError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Always answers with the same text
    pub fn constant(text: &'static str) -> Arc<Self> {
        Self::new(move |_| Ok(text_response(text)))
    }

    /// Always fails
    pub fn failing() -> Arc<Self> {
        Self::new(|_| Err(LLMError::RequestFailed("backend down".into())))
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LLMProvider for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> research_llm::Result<CompletionResponse> {
        let response = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        response
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn text_response(text: &str) -> CompletionResponse {
    CompletionResponse {
        message: Message::assistant(text),
        stop_reason: StopReason::EndTurn,
        usage: TokenUsage::default(),
    }
}

pub fn tool_call_response(name: &str, input: Value) -> CompletionResponse {
    CompletionResponse {
        message: Message::assistant_blocks(vec![ContentBlock::ToolUse {
            id: format!("{name}-0"),
            name: name.to_string(),
            input,
        }]),
        stop_reason: StopReason::ToolUse,
        usage: TokenUsage::default(),
    }
}

/// Text of the first user message, i.e. the task or phase prompt
pub fn first_user_text(request: &CompletionRequest) -> String {
    request
        .messages
        .first()
        .and_then(Message::text)
        .unwrap_or_default()
}

/// True once the conversation contains a tool result
pub fn has_tool_result(request: &CompletionRequest) -> bool {
    request.messages.iter().any(|m| {
        matches!(
            &m.content,
            Some(research_llm::MessageContent::Blocks(blocks))
                if blocks.iter().any(|b| matches!(b, ContentBlock::ToolResult { .. }))
        )
    })
}

pub fn test_config() -> ResearchConfig {
    ResearchConfig::builder()
        .google_api_key("test-google")
        .tavily_api_key("test-tavily")
        .build()
        .unwrap()
}

pub fn market_gateway(mock: MockMarketDataProvider) -> MarketDataGateway {
    MarketDataGateway::new(Arc::new(mock), &test_config())
}

pub fn news_item(title: &str) -> NewsItem {
    NewsItem {
        title: title.to_string(),
        url: format!("https://news.example/{}", title.to_lowercase().replace(' ', "-")),
        content: format!("{title}. Full story inside."),
        published_date: Some("2026-10-14".to_string()),
        score: Some(0.8),
    }
}
