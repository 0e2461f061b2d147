//! OpenAI-compatible chat completions transport.
//!
//! Serves three backends that share the `/chat/completions` wire format:
//! OpenAI itself, Groq (same format under a different root) and Azure
//! OpenAI (deployment-scoped URL, `api-key` header).

use agentloom_core::error::TransportError;
use agentloom_core::message::{Message, Role, ToolCall};
use agentloom_core::transport::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// How the API key travels.
#[derive(Clone)]
enum Auth {
    /// `Authorization: Bearer <key>`
    Bearer(String),
    /// `api-key: <key>` (Azure)
    ApiKeyHeader(String),
}

/// A transport for any endpoint speaking the OpenAI chat completions format.
pub struct OpenAiCompatTransport {
    name: String,
    kind: ProviderKind,
    url: String,
    auth: Auth,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatTransport {
    /// Create a transport against `{base_url}/chat/completions` with bearer auth.
    pub fn new(
        name: impl Into<String>,
        kind: ProviderKind,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            name: name.into(),
            kind,
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            auth: Auth::Bearer(api_key.into()),
            model: model.into(),
            client: http::client(),
        }
    }

    /// OpenAI (convenience constructor).
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("openai", ProviderKind::OpenAi, OPENAI_BASE_URL, api_key, model)
    }

    /// Groq (convenience constructor).
    pub fn groq(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("groq", ProviderKind::Groq, GROQ_BASE_URL, api_key, model)
    }

    /// Azure OpenAI. The deployment selects the model; `model` is only
    /// echoed in the request body and logs.
    pub fn azure(
        endpoint: &str,
        deployment: &str,
        api_version: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: "azure".into(),
            kind: ProviderKind::Azure,
            url: format!(
                "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
                endpoint.trim_end_matches('/')
            ),
            auth: Auth::ApiKeyHeader(api_key.into()),
            model: model.into(),
            client: http::client(),
        }
    }

    /// The full chat completions URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Convert our Message types to OpenAI API format.
    ///
    /// The API rejects an assistant `tool_calls` entry that no later `tool`
    /// message answers, so unanswered calls are left out of the request.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let tool_calls: Vec<ApiToolCall> = m
                    .tool_calls
                    .iter()
                    .filter(|tc| {
                        messages[i + 1..]
                            .iter()
                            .any(|later| later.role == Role::Tool && later.tool_call_id.as_deref() == Some(tc.id.as_str()))
                    })
                    .map(|tc| ApiToolCall {
                        id: tc.id.clone(),
                        r#type: "function".into(),
                        function: ApiFunction {
                            name: tc.name.clone(),
                            arguments: tc.arguments.to_string(),
                        },
                    })
                    .collect();
                if tool_calls.len() < m.tool_calls.len() {
                    debug!(
                        dropped = m.tool_calls.len() - tool_calls.len(),
                        "Leaving unanswered tool calls out of the request"
                    );
                }
                let tool_calls = (!tool_calls.is_empty()).then_some(tool_calls);

                ApiMessage {
                    role: match m.role {
                        Role::User => "user".into(),
                        Role::Assistant => "assistant".into(),
                        Role::System => "system".into(),
                        Role::Tool => "tool".into(),
                    },
                    // An assistant turn that only calls tools carries no content
                    content: if tool_calls.is_some() && m.content.is_empty() {
                        None
                    } else {
                        Some(m.content.clone())
                    },
                    tool_calls,
                    tool_call_id: m.tool_call_id.clone(),
                }
            })
            .collect()
    }

    fn build_body(&self, request: &TransportRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.generation.temperature,
            "max_tokens": request.generation.max_tokens,
        });

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(request.tools);
            body["tool_choice"] = serde_json::json!("auto");
        }

        body
    }

    fn first_message(response: &RawResponse) -> &serde_json::Value {
        &response.body["choices"][0]["message"]
    }
}

#[async_trait]
impl ModelTransport for OpenAiCompatTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send_raw(&self, request: TransportRequest) -> std::result::Result<RawResponse, TransportError> {
        let body = self.build_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending completion request"
        );

        let builder = self.client.post(&self.url).header("Content-Type", "application/json");
        let builder = match &self.auth {
            Auth::Bearer(key) => builder.header("Authorization", format!("Bearer {key}")),
            Auth::ApiKeyHeader(key) => builder.header("api-key", key),
        };

        let response = builder.json(&body).send().await.map_err(http::network_error)?;
        let json = http::read_json(&self.name, response).await?;

        let has_choice = json["choices"].as_array().is_some_and(|c| !c.is_empty());
        if !has_choice {
            return Err(TransportError::MalformedResponse("No choices in response".into()));
        }

        Ok(RawResponse::new(json))
    }

    fn is_finished(&self, response: &RawResponse) -> bool {
        let finish_reason = response.body["choices"][0]["finish_reason"].as_str();
        let has_tool_calls = Self::first_message(response)["tool_calls"]
            .as_array()
            .is_some_and(|calls| !calls.is_empty());
        finish_reason != Some("tool_calls") && !has_tool_calls
    }

    fn extract_tool_calls(&self, response: &RawResponse) -> std::result::Result<Vec<ToolCall>, TransportError> {
        let Some(calls) = Self::first_message(response)["tool_calls"].as_array() else {
            return Ok(Vec::new());
        };

        calls
            .iter()
            .map(|call| {
                let api: ApiToolCall = serde_json::from_value(call.clone())
                    .map_err(|e| TransportError::MalformedResponse(format!("Invalid tool call: {e}")))?;
                let arguments = if api.function.arguments.trim().is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str(&api.function.arguments).map_err(|e| {
                        TransportError::MalformedResponse(format!(
                            "Arguments for '{}' are not valid JSON: {e}",
                            api.function.name
                        ))
                    })?
                };
                Ok(ToolCall::new(api.id, api.function.name, arguments))
            })
            .collect()
    }

    fn extract_text(&self, response: &RawResponse) -> String {
        Self::first_message(response)["content"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }

    fn usage(&self, response: &RawResponse) -> Option<Usage> {
        serde_json::from_value(response.body.get("usage")?.clone()).ok()
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(default = "function_type")]
    r#type: String,
    function: ApiFunction,
}

fn function_type() -> String {
    "function".into()
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}
