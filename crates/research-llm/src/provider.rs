//! Inference backend trait

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// An inference backend that turns a conversation into the next assistant turn
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Short backend identifier, e.g. "gemini" or "openai"
    fn name(&self) -> &str;
}
