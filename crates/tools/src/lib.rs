//! Built-in tool implementations for AgentLoom.
//!
//! Tools give the agent the ability to reach beyond the model:
//! search ingested knowledge, save and recall named facts, check the
//! (demo) weather, and hand a question over to a human.

pub mod human;
pub mod knowledge;
pub mod knowledge_search;
pub mod weather;

use agentloom_core::error::ToolError;
use agentloom_core::tool::ToolRegistry;
use agentloom_memory::{KnowledgeStore, VectorStore};
use std::sync::Arc;

pub use human::{HUMAN_TOOL_NAME, HumanInput, HumanTool, StdinHumanInput};
pub use knowledge::{GetKnowledgeTool, SaveKnowledgeTool};
pub use knowledge_search::{DEFAULT_SEARCH_K, KnowledgeSearchTool};
pub use weather::WeatherTool;

/// Collaborators for the built-in tools. A tool is only registered when the
/// thing it needs is present; the weather tool is always available.
pub struct BuiltinTools {
    pub vector_store: Option<Arc<VectorStore>>,
    pub search_k: usize,
    pub knowledge: Option<Arc<dyn KnowledgeStore>>,
    pub human: Option<Arc<dyn HumanInput>>,
}

impl Default for BuiltinTools {
    fn default() -> Self {
        Self {
            vector_store: None,
            search_k: DEFAULT_SEARCH_K,
            knowledge: None,
            human: None,
        }
    }
}

/// Create a tool registry with the built-in tools.
pub fn default_registry(builtins: BuiltinTools) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WeatherTool))?;

    if let Some(store) = builtins.vector_store {
        registry.register(Arc::new(KnowledgeSearchTool::new(store).with_default_k(builtins.search_k)))?;
    }
    if let Some(knowledge) = builtins.knowledge {
        registry.register(Arc::new(GetKnowledgeTool::new(knowledge.clone())))?;
        registry.register(Arc::new(SaveKnowledgeTool::new(knowledge)))?;
    }
    if let Some(human) = builtins.human {
        registry.register(Arc::new(HumanTool::new(human)))?;
    }
    Ok(registry)
}
