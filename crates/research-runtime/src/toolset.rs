//! Capability-scoped tool sets
//!
//! A [`ToolSet`] is fixed at construction: agents receive exactly the tools
//! they may call and nothing can be registered afterwards.

use crate::{RuntimeError, Tool, Result};
use research_llm::ToolDefinition;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct ToolSet {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolSet {
    /// An empty set; agents built with it cannot call any tool
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from the granted tools, rejecting duplicate names
    pub fn new(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for tool in tools {
            let name = tool.name().to_string();
            if map.insert(name.clone(), tool).is_some() {
                return Err(RuntimeError::DuplicateTool(name));
            }
        }
        Ok(Self { tools: map })
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn permits(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Granted tool names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet").field("tools", &self.names()).finish()
    }
}
