//! Runtime error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Inference backend failure
    #[error("LLM error: {0}")]
    Llm(#[from] research_llm::LLMError),

    /// A tool ran and reported a failure
    #[error("Tool '{name}' failed: {message}")]
    ToolFailed { name: String, message: String },

    /// Tool arguments did not match the tool's schema
    #[error("Invalid input for tool '{name}': {message}")]
    InvalidInput { name: String, message: String },

    /// The model asked for a tool outside the agent's capability set
    #[error("Tool '{0}' is not permitted for this agent")]
    ToolNotPermitted(String),

    /// Two tools with the same name were granted to one agent
    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    /// The shared step budget has no steps left
    #[error("Step budget exhausted after {0} steps")]
    BudgetExhausted(usize),
}

impl RuntimeError {
    pub fn tool_failed(name: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::ToolFailed {
            name: name.into(),
            message: message.to_string(),
        }
    }
}
