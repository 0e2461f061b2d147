//! Human hand-off tool.
//!
//! When the model calls `human`, the question is put to a person through a
//! [`HumanInput`] source and their answer becomes the tool result. The
//! conversation loop treats this tool as a hand-off: the answer is returned
//! to the caller without another model turn.

use agentloom_core::error::ToolError;
use agentloom_core::tool::{Tool, ToolOutput};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

pub const HUMAN_TOOL_NAME: &str = "human";

/// Somewhere to ask a person a question.
#[async_trait]
pub trait HumanInput: Send + Sync {
    async fn ask(&self, question: &str) -> Result<String, ToolError>;
}

/// Asks on stdout and reads one line from stdin.
pub struct StdinHumanInput {
    reader: Mutex<BufReader<tokio::io::Stdin>>,
}

impl StdinHumanInput {
    pub fn new() -> Self {
        Self {
            reader: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }
}

impl Default for StdinHumanInput {
    fn default() -> Self {
        Self::new()
    }
}

fn io_failure(e: std::io::Error) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: HUMAN_TOOL_NAME.to_string(),
        reason: e.to_string(),
    }
}

impl StdinHumanInput {
    /// Write `prompt` and read one line. `None` once stdin is closed.
    /// Uses the same buffered reader as [`HumanInput::ask`].
    pub async fn prompt(&self, prompt: &str) -> std::io::Result<Option<String>> {
        let mut reader = self.reader.lock().await;

        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end().to_string()))
    }
}

#[async_trait]
impl HumanInput for StdinHumanInput {
    async fn ask(&self, question: &str) -> Result<String, ToolError> {
        self.prompt(&format!("\n[agent asks] {question}\n> "))
            .await
            .map_err(io_failure)?
            .ok_or_else(|| ToolError::ExecutionFailed {
                tool_name: HUMAN_TOOL_NAME.to_string(),
                reason: "stdin closed before an answer was given".into(),
            })
    }
}

/// Hands a question over to a person.
pub struct HumanTool {
    input: Arc<dyn HumanInput>,
}

impl HumanTool {
    pub fn new(input: Arc<dyn HumanInput>) -> Self {
        Self { input }
    }
}

#[async_trait]
impl Tool for HumanTool {
    fn name(&self) -> &str {
        HUMAN_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Ask a human for help when you cannot answer on your own or need a decision or confirmation."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The question to ask the human"
                }
            },
            "required": ["question"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let question = arguments["question"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'question' argument".into()))?;
        let answer = self.input.ask(question).await?;
        Ok(ToolOutput::text(answer))
    }
}
