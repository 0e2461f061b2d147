//! Google Gemini `generateContent` transport.
//!
//! Gemini differs from the OpenAI family in every shape the loop touches:
//! system text travels as `systemInstruction`, the assistant role is
//! `model`, tool calls are `functionCall` parts without ids and tool results
//! go back as `functionResponse` parts. A response counts as finished when
//! it carries any text.

use agentloom_core::error::TransportError;
use agentloom_core::message::{Message, Role, ToolCall};
use agentloom_core::transport::*;
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::http;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiTransport {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiTransport {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(GEMINI_BASE_URL, api_key, model)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client: http::client(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }

    /// Build the `generateContent` body. Consecutive tool results are folded
    /// into one `user` turn so every `functionCall` turn is answered at once.
    fn build_body(request: &TransportRequest) -> Value {
        let mut system_parts: Vec<Value> = Vec::new();
        let mut contents: Vec<Value> = Vec::new();

        for message in &request.messages {
            match message.role {
                Role::System => system_parts.push(json!({ "text": message.content })),
                Role::User => contents.push(json!({
                    "role": "user",
                    "parts": [{ "text": message.content }],
                })),
                Role::Assistant => contents.push(Self::model_turn(message)),
                Role::Tool => {
                    let part = json!({
                        "functionResponse": {
                            "name": message.tool_name.clone().unwrap_or_default(),
                            "response": { "content": message.content },
                        }
                    });
                    let extend_previous = contents.last().is_some_and(|c| {
                        c["role"] == "user" && c["parts"][0].get("functionResponse").is_some()
                    });
                    match contents.last_mut() {
                        Some(last) if extend_previous => {
                            if let Some(parts) = last["parts"].as_array_mut() {
                                parts.push(part);
                            }
                        }
                        _ => contents.push(json!({ "role": "user", "parts": [part] })),
                    }
                }
            }
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": request.generation.temperature,
                "maxOutputTokens": request.generation.max_tokens,
            },
        });

        if !system_parts.is_empty() {
            body["systemInstruction"] = json!({ "parts": system_parts });
        }

        if !request.tools.is_empty() {
            body["tools"] = json!([{ "functionDeclarations": request.tools }]);
        }

        body
    }

    fn model_turn(message: &Message) -> Value {
        let mut parts: Vec<Value> = Vec::new();
        if !message.content.is_empty() {
            parts.push(json!({ "text": message.content }));
        }
        for call in &message.tool_calls {
            parts.push(json!({
                "functionCall": { "name": call.name, "args": call.arguments }
            }));
        }
        if parts.is_empty() {
            parts.push(json!({ "text": "" }));
        }
        json!({ "role": "model", "parts": parts })
    }

    fn parts(response: &RawResponse) -> &[Value] {
        response.body["candidates"][0]["content"]["parts"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[async_trait]
impl ModelTransport for GeminiTransport {
    fn name(&self) -> &str {
        "gemini"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send_raw(&self, request: TransportRequest) -> std::result::Result<RawResponse, TransportError> {
        let body = Self::build_body(&request);

        debug!(
            provider = "gemini",
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(http::network_error)?;

        let json = http::read_json("gemini", response).await?;

        let has_candidate = json["candidates"].as_array().is_some_and(|c| !c.is_empty());
        if !has_candidate {
            let reason = json["promptFeedback"]["blockReason"]
                .as_str()
                .unwrap_or("no candidates in response");
            return Err(TransportError::MalformedResponse(reason.to_string()));
        }

        Ok(RawResponse::new(json))
    }

    fn is_finished(&self, response: &RawResponse) -> bool {
        !self.extract_text(response).is_empty()
    }

    fn extract_tool_calls(&self, response: &RawResponse) -> std::result::Result<Vec<ToolCall>, TransportError> {
        Self::parts(response)
            .iter()
            .filter_map(|part| part.get("functionCall"))
            .map(|call| {
                let name = call["name"]
                    .as_str()
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| TransportError::MalformedResponse("functionCall without a name".into()))?;
                let args = match call.get("args") {
                    None | Some(Value::Null) => json!({}),
                    Some(args) => args.clone(),
                };
                let id = format!("call_{}", uuid::Uuid::new_v4().simple());
                Ok(ToolCall::new(id, name, args))
            })
            .collect()
    }

    fn extract_text(&self, response: &RawResponse) -> String {
        Self::parts(response)
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect()
    }

    fn usage(&self, response: &RawResponse) -> Option<Usage> {
        let meta = response.body.get("usageMetadata")?;
        let count = |key: &str| meta[key].as_u64().unwrap_or(0) as u32;
        Some(Usage {
            prompt_tokens: count("promptTokenCount"),
            completion_tokens: count("candidatesTokenCount"),
            total_tokens: count("totalTokenCount"),
        })
    }
}
