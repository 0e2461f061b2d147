//! Message and Conversation domain types.
//!
//! These are the value objects that flow through the conversation loop:
//! caller input → user message → model transport → assistant message (text or
//! tool calls) → tool messages → back to the transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The model
    Assistant,
    /// System instructions and seeded memory
    System,
    /// Tool execution result
    Tool,
}

/// A request from the model to execute a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID, echoed back on the matching tool message
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Parsed arguments
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// If this is a tool result, the name of the tool that produced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content.into())
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content.into())
    }

    /// Create an assistant message that carries tool calls.
    pub fn assistant_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        let mut msg = Self::with_role(Role::Assistant, content.into());
        msg.tool_calls = tool_calls;
        msg
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content.into())
    }

    /// Create a tool result message.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let mut msg = Self::with_role(Role::Tool, content.into());
        msg.tool_call_id = Some(tool_call_id.into());
        msg.tool_name = Some(tool_name.into());
        msg
    }
}

/// A conversation is an ordered, append-only sequence of messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,

    messages: Vec<Message>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a conversation that starts with a system message.
    pub fn with_system(prompt: impl Into<String>) -> Self {
        let mut conv = Self::new();
        conv.push(Message::system(prompt));
        conv
    }

    /// Add a message to the conversation.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// Append several messages in order.
    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        for message in messages {
            self.push(message);
        }
    }

    /// The transcript, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Tool messages whose `tool_call_id` does not match a tool call carried
    /// by an earlier assistant message.
    pub fn orphan_tool_results(&self) -> Vec<&Message> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut orphans = Vec::new();
        for msg in &self.messages {
            match msg.role {
                Role::Assistant => {
                    seen.extend(msg.tool_calls.iter().map(|tc| tc.id.as_str()));
                }
                Role::Tool => {
                    let matched = msg
                        .tool_call_id
                        .as_deref()
                        .is_some_and(|id| seen.contains(id));
                    if !matched {
                        orphans.push(msg);
                    }
                }
                _ => {}
            }
        }
        orphans
    }

    /// Whether every tool result answers a preceding tool call.
    pub fn is_consistent(&self) -> bool {
        self.orphan_tool_results().is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, agent!");
        assert!(msg.tool_calls.is_empty());
        assert!(msg.tool_name.is_none());
    }

    #[test]
    fn tool_result_carries_call_and_name() {
        let msg = Message::tool_result("call_1", "echo", "hi");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(msg.tool_name.as_deref(), Some("echo"));
    }

    #[test]
    fn conversation_tracks_updates() {
        let mut conv = Conversation::new();
        let created = conv.created_at;

        conv.push(Message::user("First message"));
        assert_eq!(conv.len(), 1);
        assert!(conv.updated_at >= created);
    }

    #[test]
    fn with_system_seeds_first_message() {
        let conv = Conversation::with_system("Be brief.");
        assert_eq!(conv.messages()[0].role, Role::System);
    }

    #[test]
    fn consistent_transcript_has_no_orphans() {
        let mut conv = Conversation::new();
        conv.push(Message::user("go"));
        conv.push(Message::assistant_tool_calls(
            "",
            vec![ToolCall::new("call_1", "echo", serde_json::json!({"text": "hi"}))],
        ));
        conv.push(Message::tool_result("call_1", "echo", "hi"));
        conv.push(Message::assistant("done"));
        assert!(conv.is_consistent());
    }

    #[test]
    fn tool_result_before_its_call_is_orphaned() {
        let mut conv = Conversation::new();
        conv.push(Message::tool_result("call_9", "echo", "early"));
        conv.push(Message::assistant_tool_calls(
            "",
            vec![ToolCall::new("call_9", "echo", serde_json::json!({}))],
        ));
        let orphans = conv.orphan_tool_results();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].content, "early");
    }

    #[test]
    fn tool_result_without_id_is_orphaned() {
        let mut conv = Conversation::new();
        let mut msg = Message::tool_result("x", "echo", "no id");
        msg.tool_call_id = None;
        conv.push(msg);
        assert!(!conv.is_consistent());
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::assistant_tool_calls(
            "",
            vec![ToolCall::new("call_1", "echo", serde_json::json!({"text": "hi"}))],
        );
        let json = serde_json::to_string(&msg).unwrap();
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.tool_calls, msg.tool_calls);
        assert_eq!(deserialized.role, Role::Assistant);
    }
}
