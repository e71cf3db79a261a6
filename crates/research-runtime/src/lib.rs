//! Agent runtime for equity-research
//!
//! - [`Tool`]: a callable capability
//! - [`ToolSet`]: the immutable set of tools one agent is granted
//! - [`AgentExecutor`]: the model/tool loop over a [`ToolSet`]
//! - [`StepBudget`]: a shared cap on invocations across a run

pub mod budget;
pub mod error;
pub mod executor;
pub mod logging;
pub mod tool;
pub mod toolset;

pub use budget::StepBudget;
pub use error::{Result, RuntimeError};
pub use executor::{AgentExecutor, AgentRun, ExecutorConfig, ToolCallRecord};
pub use tool::Tool;
pub use toolset::ToolSet;
