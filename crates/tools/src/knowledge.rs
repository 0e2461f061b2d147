//! Knowledge key/value tools: `get_knowledge` and `save_knowledge`.

use agentloom_core::error::ToolError;
use agentloom_core::tool::{Tool, ToolOutput};
use agentloom_memory::KnowledgeStore;
use async_trait::async_trait;
use std::sync::Arc;

const NOT_FOUND: &str = "No information found in the knowledge base.";
const SAVED: &str = "Information saved successfully.";

fn required_str<'a>(arguments: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    arguments[key]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

fn storage_failure(tool: &str, e: impl std::fmt::Display) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: tool.to_string(),
        reason: e.to_string(),
    }
}

/// Looks up a value by key.
pub struct GetKnowledgeTool {
    store: Arc<dyn KnowledgeStore>,
}

impl GetKnowledgeTool {
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for GetKnowledgeTool {
    fn name(&self) -> &str {
        "get_knowledge"
    }

    fn description(&self) -> &str {
        "Retrieve information from the knowledge base"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "key": { "type": "string", "description": "The key to retrieve" }
            },
            "required": ["key"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let key = required_str(&arguments, "key")?;
        let value = self
            .store
            .get(key)
            .await
            .map_err(|e| storage_failure(self.name(), e))?;
        Ok(ToolOutput::text(value.unwrap_or_else(|| NOT_FOUND.to_string())))
    }
}

/// Stores a value under a key, replacing any previous value.
pub struct SaveKnowledgeTool {
    store: Arc<dyn KnowledgeStore>,
}

impl SaveKnowledgeTool {
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SaveKnowledgeTool {
    fn name(&self) -> &str {
        "save_knowledge"
    }

    fn description(&self) -> &str {
        "Save information to the knowledge base"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "key": { "type": "string", "description": "The key to save under" },
                "value": { "type": "string", "description": "The value to save" }
            },
            "required": ["key", "value"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let key = required_str(&arguments, "key")?;
        let value = required_str(&arguments, "value")?;
        self.store
            .put(key, value)
            .await
            .map_err(|e| storage_failure(self.name(), e))?;
        Ok(ToolOutput::text(SAVED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentloom_memory::InMemoryKnowledgeStore;
    use serde_json::json;

    #[tokio::test]
    async fn save_then_get() {
        let store: Arc<dyn KnowledgeStore> = Arc::new(InMemoryKnowledgeStore::new());
        let save = SaveKnowledgeTool::new(store.clone());
        let get = GetKnowledgeTool::new(store);

        let saved = save.execute(json!({"key": "deadline", "value": "Friday"})).await.unwrap();
        assert_eq!(saved.content, SAVED);

        let found = get.execute(json!({"key": "deadline"})).await.unwrap();
        assert_eq!(found.content, "Friday");
    }

    #[tokio::test]
    async fn get_missing_key() {
        let get = GetKnowledgeTool::new(Arc::new(InMemoryKnowledgeStore::new()));
        let found = get.execute(json!({"key": "nope"})).await.unwrap();
        assert_eq!(found.content, NOT_FOUND);
    }

    #[tokio::test]
    async fn save_requires_value() {
        let save = SaveKnowledgeTool::new(Arc::new(InMemoryKnowledgeStore::new()));
        let err = save.execute(json!({"key": "k"})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
