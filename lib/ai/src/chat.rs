//! Chat message types for the model gateway.
//!
//! These are the wire-agnostic shapes the orchestrator assembles and the
//! gateway translates into the upstream API format.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The role of a message in the gateway context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instruction.
    System,
    /// User/human message.
    User,
    /// Assistant/model message.
    Assistant,
    /// Tool result message.
    Tool,
}

/// A model-issued request to invoke a named tool with JSON arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Upstream-assigned invocation ID; answered by exactly one tool message.
    pub id: String,
    /// The tool name.
    pub name: String,
    /// Argument payload. Opaque JSON owned by the model's decision; treat as
    /// untrusted input.
    pub arguments: JsonValue,
}

impl ToolCallRequest {
    /// Creates a new tool call request.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: JsonValue) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// A message in the gateway context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role.
    pub role: ChatRole,
    /// Text content. `None` for assistant messages that only carry tool calls.
    pub content: Option<String>,
    /// Tool invocation requests (assistant messages only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// The invocation this message answers (tool messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates an assistant message with text content.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates an assistant message carrying tool invocation requests.
    #[must_use]
    pub fn assistant_tool_calls(content: Option<String>, calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content,
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    /// Creates a tool result message answering `tool_call_id`.
    #[must_use]
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Returns true if this message carries tool calls.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Specification of a tool offered to the model during a decision call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// JSON schema for the argument payload.
    pub parameters: JsonValue,
}

impl ToolSpec {
    /// Creates a new tool spec.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: JsonValue,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// The outcome of a decision call: either a finished text reply, or a set of
/// tool invocations the model wants executed before it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The model answered directly.
    Text(String),
    /// The model requested tool invocations.
    ToolCalls {
        /// Optional text accompanying the calls.
        content: Option<String>,
        /// Requested invocations, in the order the model emitted them.
        calls: Vec<ToolCallRequest>,
    },
}

impl Decision {
    /// Returns true if this decision requests tool invocations.
    #[must_use]
    pub fn is_tool_calls(&self) -> bool {
        matches!(self, Self::ToolCalls { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_tool_call_message() {
        let call = ToolCallRequest::new("call_1", "web_search", serde_json::json!({"query": "q"}));
        let msg = ChatMessage::assistant_tool_calls(None, vec![call]);

        assert!(msg.has_tool_calls());
        assert!(msg.content.is_none());
        assert_eq!(msg.tool_calls[0].name, "web_search");
    }

    #[test]
    fn tool_message_carries_invocation_id() {
        let msg = ChatMessage::tool("call_9", r#"{"status":"ok"}"#);
        assert_eq!(msg.role, ChatRole::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_9"));
    }

    #[test]
    fn plain_messages_skip_tool_fields_in_json() {
        let msg = ChatMessage::user("Hello");
        let json = serde_json::to_value(&msg).expect("serialize");

        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "Hello");
        assert!(json.get("tool_calls").is_none());
        assert!(json.get("tool_call_id").is_none());
    }

    #[test]
    fn decision_kind_check() {
        let text = Decision::Text("done".to_string());
        assert!(!text.is_tool_calls());

        let calls = Decision::ToolCalls {
            content: None,
            calls: vec![ToolCallRequest::new("c", "t", serde_json::json!({}))],
        };
        assert!(calls.is_tool_calls());
    }
}
