//! Tool trait — the abstraction over capabilities the model can invoke.
//!
//! Tools are registered by name in a [`ToolRegistry`]. The registry hands the
//! conversation loop provider-shaped declarations and executes calls, turning
//! every failure (including a panicking tool) into a [`ToolError`].

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::transport::ProviderKind;

pub use crate::message::ToolCall;

/// What a tool returns on success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Text handed back to the model
    pub content: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            data: None,
        }
    }

    /// Structured output; the model sees the compact JSON rendering.
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            content: value.to_string(),
            data: Some(value),
        }
    }
}

/// The outcome of executing one [`ToolCall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result answers
    pub call_id: String,

    /// Name of the tool that ran
    pub name: String,

    /// Output text
    pub content: String,
}

/// Provider-neutral description of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// JSON Schema (an object schema)
    pub parameters: serde_json::Value,
}

/// The core Tool trait.
///
/// Each built-in tool (knowledge search, weather, hand-off, ...) implements
/// this trait and is registered in the [`ToolRegistry`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "knowledge_search").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolOutput, ToolError>;

    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

type ToolHandler =
    Box<dyn Fn(serde_json::Value) -> BoxFuture<'static, std::result::Result<ToolOutput, ToolError>> + Send + Sync>;

/// A tool backed by a closure.
pub struct FnTool {
    name: String,
    description: String,
    schema: serde_json::Value,
    handler: ToolHandler,
}

impl FnTool {
    /// Wrap an async closure returning the tool's text output.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: serde_json::Value,
        handler: F,
    ) -> Self
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<String, ToolError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            handler: Box::new(move |args| handler(args).map(|r| r.map(ToolOutput::text)).boxed()),
        }
    }

    /// Wrap a synchronous closure.
    pub fn sync<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: serde_json::Value,
        handler: F,
    ) -> Self
    where
        F: Fn(serde_json::Value) -> std::result::Result<String, ToolError> + Send + Sync + 'static,
    {
        Self::new(name, description, schema, move |args| std::future::ready(handler(args)))
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.schema.clone()
    }

    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolOutput, ToolError> {
        (self.handler)(arguments).await
    }
}

/// Map a declaration to the OpenAI function-calling shape
/// (shared by OpenAI, Azure OpenAI and Groq).
pub fn openai_declaration(decl: &ToolDeclaration) -> serde_json::Value {
    serde_json::json!({
        "type": "function",
        "function": {
            "name": decl.name,
            "description": decl.description,
            "parameters": decl.parameters,
        }
    })
}

/// Map a declaration to the Gemini `functionDeclarations` entry shape.
/// Gemini spells schema types in upper case (`OBJECT`, `STRING`).
pub fn gemini_declaration(decl: &ToolDeclaration) -> serde_json::Value {
    let mut parameters = decl.parameters.clone();
    uppercase_schema_types(&mut parameters);
    serde_json::json!({
        "name": decl.name,
        "description": decl.description,
        "parameters": parameters,
    })
}

fn uppercase_schema_types(schema: &mut serde_json::Value) {
    match schema {
        serde_json::Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                match value {
                    serde_json::Value::String(s) if key == "type" => *s = s.to_uppercase(),
                    other => uppercase_schema_types(other),
                }
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(uppercase_schema_types),
        _ => {}
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}

/// A registry of available tools, keyed (and ordered) by name.
///
/// The conversation loop uses this to:
/// 1. Get tool declarations to send to the model
/// 2. Look up and execute tools when the model requests them
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name is replaced and returned.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> std::result::Result<Option<Arc<dyn Tool>>, ToolError> {
        let name = tool.name().to_string();
        if name.trim().is_empty() {
            return Err(ToolError::InvalidDefinition("tool name must not be empty".into()));
        }
        if !tool.parameters_schema().is_object() {
            return Err(ToolError::InvalidDefinition(format!(
                "parameters schema of '{name}' must be a JSON object"
            )));
        }

        let replaced = self.tools.insert(name.clone(), tool);
        if replaced.is_some() {
            warn!(tool = %name, "Tool re-registered; previous definition replaced");
        }
        Ok(replaced)
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Provider-neutral declarations, ordered by name.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools.values().map(|t| t.declaration()).collect()
    }

    /// Declarations in the shape the given provider expects.
    pub fn declarations_for(&self, kind: ProviderKind) -> Vec<serde_json::Value> {
        let map: fn(&ToolDeclaration) -> serde_json::Value = match kind {
            ProviderKind::OpenAi | ProviderKind::Azure | ProviderKind::Groq => openai_declaration,
            ProviderKind::Gemini => gemini_declaration,
        };
        self.declarations().iter().map(map).collect()
    }

    /// Invoke a tool by name. Errors and panics inside the tool surface as
    /// [`ToolError::ExecutionFailed`].
    pub async fn invoke(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let tool = self.tools.get(name).ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        debug!(tool = %name, "Executing tool");

        match AssertUnwindSafe(tool.execute(arguments)).catch_unwind().await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(ToolError::ExecutionFailed { tool_name, reason })) => {
                Err(ToolError::ExecutionFailed { tool_name, reason })
            }
            Ok(Err(e)) => Err(ToolError::ExecutionFailed {
                tool_name: name.to_string(),
                reason: e.to_string(),
            }),
            Err(payload) => Err(ToolError::ExecutionFailed {
                tool_name: name.to_string(),
                reason: format!("panicked: {}", panic_message(payload.as_ref())),
            }),
        }
    }

    /// Execute a tool call.
    pub async fn execute(&self, call: &ToolCall) -> std::result::Result<ToolResult, ToolError> {
        let output = self.invoke(&call.name, call.arguments.clone()).await?;
        Ok(ToolResult {
            call_id: call.id.clone(),
            name: call.name.clone(),
            content: output.content,
        })
    }

    /// All registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str { "echo" }
        fn description(&self) -> &str { "Echoes back the input" }
        fn parameters_schema(&self) -> serde_json::Value {
            json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolOutput, ToolError> {
            Ok(ToolOutput::text(arguments["text"].as_str().unwrap_or("")))
        }
    }

    struct PanicTool;

    #[async_trait]
    impl Tool for PanicTool {
        fn name(&self) -> &str { "boom" }
        fn description(&self) -> &str { "Always panics" }
        fn parameters_schema(&self) -> serde_json::Value { json!({"type": "object"}) }
        async fn execute(&self, _arguments: serde_json::Value) -> std::result::Result<ToolOutput, ToolError> {
            panic!("kaboom");
        }
    }

    fn registry_with_echo() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        registry
    }

    #[test]
    fn registry_register_and_lookup() {
        let registry = registry_with_echo();
        assert!(registry.get("echo").is_some());
        assert!(registry.contains("echo"));
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register_rejects_empty_name() {
        let mut registry = ToolRegistry::new();
        let tool = FnTool::sync("  ", "nameless", json!({"type": "object"}), |_| Ok(String::new()));
        let err = registry.register(Arc::new(tool)).err().unwrap();
        assert!(matches!(err, ToolError::InvalidDefinition(_)));
    }

    #[test]
    fn register_rejects_non_object_schema() {
        let mut registry = ToolRegistry::new();
        let tool = FnTool::sync("bad", "bad schema", json!("string"), |_| Ok(String::new()));
        assert!(registry.register(Arc::new(tool)).is_err());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn register_is_last_writer_wins() {
        let mut registry = registry_with_echo();
        let shout = FnTool::sync("echo", "Shouts", json!({"type": "object"}), |args| {
            Ok(args["text"].as_str().unwrap_or("").to_uppercase())
        });
        let replaced = registry.register(Arc::new(shout)).unwrap();
        assert!(replaced.is_some());
        assert_eq!(registry.len(), 1);

        let out = registry.invoke("echo", json!({"text": "hi"})).await.unwrap();
        assert_eq!(out.content, "HI");
    }

    #[test]
    fn openai_declarations_wrap_function() {
        let registry = registry_with_echo();
        let decls = registry.declarations_for(ProviderKind::Groq);
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0]["type"], "function");
        assert_eq!(decls[0]["function"]["name"], "echo");
        assert_eq!(decls[0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn gemini_declarations_uppercase_types() {
        let registry = registry_with_echo();
        let decls = registry.declarations_for(ProviderKind::Gemini);
        assert_eq!(decls[0]["name"], "echo");
        assert_eq!(decls[0]["parameters"]["type"], "OBJECT");
        assert_eq!(decls[0]["parameters"]["properties"]["text"]["type"], "STRING");
        assert_eq!(decls[0]["parameters"]["required"][0], "text");
    }

    #[test]
    fn declarations_are_ordered_by_name() {
        let mut registry = registry_with_echo();
        registry
            .register(Arc::new(FnTool::sync("alpha", "a", json!({"type": "object"}), |_| Ok("a".into()))))
            .unwrap();
        let names: Vec<String> = registry.declarations().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["alpha", "echo"]);
    }

    #[tokio::test]
    async fn registry_execute_tool() {
        let registry = registry_with_echo();
        let call = ToolCall::new("call_1", "echo", json!({"text": "hello world"}));
        let result = registry.execute(&call).await.unwrap();
        assert_eq!(result.call_id, "call_1");
        assert_eq!(result.name, "echo");
        assert_eq!(result.content, "hello world");
    }

    #[tokio::test]
    async fn registry_execute_missing_tool() {
        let registry = ToolRegistry::new();
        let call = ToolCall::new("call_1", "nonexistent", json!({}));
        let err = registry.execute(&call).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn tool_errors_become_execution_failed() {
        let mut registry = ToolRegistry::new();
        let tool = FnTool::sync("strict", "rejects input", json!({"type": "object"}), |_| {
            Err(ToolError::InvalidArguments("missing 'key'".into()))
        });
        registry.register(Arc::new(tool)).unwrap();

        let err = registry.invoke("strict", json!({})).await.unwrap_err();
        match err {
            ToolError::ExecutionFailed { tool_name, reason } => {
                assert_eq!(tool_name, "strict");
                assert!(reason.contains("missing 'key'"));
            }
            other => panic!("Expected ExecutionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn panicking_tool_is_contained() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(PanicTool)).unwrap();

        let err = registry.invoke("boom", json!({})).await.unwrap_err();
        assert!(err.to_string().contains("kaboom"));
    }

    #[tokio::test]
    async fn async_fn_tool_runs() {
        let tool = FnTool::new("later", "async", json!({"type": "object"}), |_| async {
            Ok("done".to_string())
        });
        let out = tool.execute(json!({})).await.unwrap();
        assert_eq!(out.content, "done");
    }

    #[test]
    fn json_output_renders_compactly() {
        let out = ToolOutput::json(json!({"a": 1}));
        assert_eq!(out.content, r#"{"a":1}"#);
        assert!(out.data.is_some());
    }
}
