//! Inference backend layer for equity-research
//!
//! Provider-agnostic message, completion and tool-definition types plus the
//! [`LLMProvider`] trait. Concrete backends live in [`providers`] behind the
//! `gemini` and `openai` features.

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod tools;

pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;
pub use tools::ToolDefinition;

#[cfg(any(feature = "gemini", feature = "openai"))]
pub mod providers;
