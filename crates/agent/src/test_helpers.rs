//! Shared test helpers for loop and workflow tests.

use agentloom_core::error::{ToolError, TransportError};
use agentloom_core::message::ToolCall;
use agentloom_core::tool::{FnTool, Tool};
use agentloom_core::transport::{ModelTransport, ProviderKind, RawResponse, TransportRequest, Usage};
use std::sync::{Arc, Mutex};

/// A transport that replays scripted responses in sequence.
///
/// Bodies use a neutral shape: `{"text": "...", "tool_calls": [{id, name,
/// arguments}]}`. A response is finished when it has no tool calls.
/// Panics if more calls are made than responses provided (unless built with
/// [`ScriptedTransport::always`]).
pub struct ScriptedTransport {
    script: Mutex<Vec<Result<RawResponse, TransportError>>>,
    repeat_last: bool,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<RawResponse>) -> Self {
        Self::from_results(responses.into_iter().map(Ok).collect())
    }

    pub fn from_results(script: Vec<Result<RawResponse, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script),
            repeat_last: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Return the same response forever.
    pub fn always(response: RawResponse) -> Self {
        Self {
            repeat_last: true,
            ..Self::new(vec![response])
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ModelTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn send_raw(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        let mut script = self.script.lock().unwrap();
        if self.repeat_last {
            return script[0].clone();
        }
        if script.is_empty() {
            panic!("ScriptedTransport: no more responses (call #{call})");
        }
        script.remove(0)
    }

    fn is_finished(&self, response: &RawResponse) -> bool {
        response.body["tool_calls"].as_array().is_none_or(|calls| calls.is_empty())
    }

    fn extract_tool_calls(&self, response: &RawResponse) -> Result<Vec<ToolCall>, TransportError> {
        Ok(response.body["tool_calls"]
            .as_array()
            .map(|calls| {
                calls
                    .iter()
                    .map(|c| {
                        ToolCall::new(
                            c["id"].as_str().unwrap_or_default(),
                            c["name"].as_str().unwrap_or_default(),
                            c["arguments"].clone(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn extract_text(&self, response: &RawResponse) -> String {
        response.body["text"].as_str().unwrap_or_default().to_string()
    }

    fn usage(&self, _response: &RawResponse) -> Option<Usage> {
        Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        })
    }
}

/// A final answer.
pub fn text_response(text: &str) -> RawResponse {
    RawResponse::new(serde_json::json!({ "text": text }))
}

/// A tool request: `(id, name, arguments)` per call.
pub fn tool_response(calls: Vec<(&str, &str, serde_json::Value)>, text: &str) -> RawResponse {
    let calls: Vec<serde_json::Value> = calls
        .into_iter()
        .map(|(id, name, arguments)| serde_json::json!({"id": id, "name": name, "arguments": arguments}))
        .collect();
    RawResponse::new(serde_json::json!({ "text": text, "tool_calls": calls }))
}

/// `echo {text}` → text
pub fn echo_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::sync(
        "echo",
        "Echo the input back",
        serde_json::json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        }),
        |args| Ok(args["text"].as_str().unwrap_or_default().to_string()),
    ))
}

/// `broken` always fails.
pub fn failing_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::sync("broken", "Always fails", serde_json::json!({"type": "object"}), |_| {
        Err(ToolError::ExecutionFailed {
            tool_name: "broken".into(),
            reason: "disk on fire".into(),
        })
    }))
}
