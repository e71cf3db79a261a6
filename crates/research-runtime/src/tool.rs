//! Tool trait

use crate::Result;
use async_trait::async_trait;
use research_llm::ToolDefinition;
use serde_json::Value;

/// A callable capability exposed to a model
///
/// Implementations validate their own JSON input and return a JSON payload
/// that is forwarded verbatim to the model as the tool result.
#[async_trait]
pub trait Tool: Send + Sync {
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Unique name within a [`crate::ToolSet`]
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the accepted input
    fn input_schema(&self) -> Value;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}
