//! Turn types for conversations.
//!
//! A turn is one entry in a conversation's append-only log. The log is the
//! single source of truth: gateway context and the active canvas record are
//! both derived from it by replay, never cached.

use canvasmith_ai::ToolCallRequest;
use canvasmith_core::{ConversationId, TurnId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The role of a turn in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// User/human message.
    User,
    /// Assistant/model message.
    Assistant,
    /// System message.
    System,
    /// Tool result message.
    Tool,
}

impl TurnRole {
    /// Returns the canonical string form used in storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Tool => "tool",
        }
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a turn role from its string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTurnRoleError {
    /// The rejected value.
    pub value: String,
}

impl fmt::Display for ParseTurnRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown turn role: {}", self.value)
    }
}

impl std::error::Error for ParseTurnRoleError {}

impl FromStr for TurnRole {
    type Err = ParseTurnRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            "tool" => Ok(Self::Tool),
            other => Err(ParseTurnRoleError {
                value: other.to_string(),
            }),
        }
    }
}

/// A single entry in the conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn identifier.
    pub id: TurnId,
    /// The conversation this turn belongs to.
    pub conversation_id: ConversationId,
    /// Turn role.
    pub role: TurnRole,
    /// Text content. `None` for assistant turns that only carry tool calls.
    pub content: Option<String>,
    /// Tool invocations requested by an assistant turn, in emission order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// The invocation a tool turn answers. Must match an invocation id from
    /// the immediately preceding assistant turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// When the turn was appended.
    pub created_at: DateTime<Utc>,
}

impl Turn {
    fn new(conversation_id: ConversationId, role: TurnRole) -> Self {
        Self {
            id: TurnId::new(),
            conversation_id,
            role,
            content: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
            created_at: Utc::now(),
        }
    }

    /// Creates a user turn.
    #[must_use]
    pub fn user(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        let mut turn = Self::new(conversation_id, TurnRole::User);
        turn.content = Some(content.into());
        turn
    }

    /// Creates an assistant turn with text content.
    #[must_use]
    pub fn assistant(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        let mut turn = Self::new(conversation_id, TurnRole::Assistant);
        turn.content = Some(content.into());
        turn
    }

    /// Creates an assistant turn carrying tool invocation requests.
    #[must_use]
    pub fn assistant_tool_calls(
        conversation_id: ConversationId,
        content: Option<String>,
        calls: Vec<ToolCallRequest>,
    ) -> Self {
        let mut turn = Self::new(conversation_id, TurnRole::Assistant);
        turn.content = content;
        turn.tool_calls = calls;
        turn
    }

    /// Creates a tool turn answering `tool_call_id` with a serialized outcome.
    #[must_use]
    pub fn tool(
        conversation_id: ConversationId,
        tool_call_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let mut turn = Self::new(conversation_id, TurnRole::Tool);
        turn.content = Some(content.into());
        turn.tool_call_id = Some(tool_call_id.into());
        turn
    }

    /// Returns true if this turn carries tool calls.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_string_roundtrip() {
        for role in [
            TurnRole::User,
            TurnRole::Assistant,
            TurnRole::System,
            TurnRole::Tool,
        ] {
            assert_eq!(role.as_str().parse::<TurnRole>(), Ok(role));
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = "moderator".parse::<TurnRole>().unwrap_err();
        assert_eq!(err.value, "moderator");
    }

    #[test]
    fn tool_turn_carries_invocation_id() {
        let turn = Turn::tool(ConversationId::new(), "call_3", r#"{"status":"ok"}"#);
        assert_eq!(turn.role, TurnRole::Tool);
        assert_eq!(turn.tool_call_id.as_deref(), Some("call_3"));
        assert!(!turn.has_tool_calls());
    }

    #[test]
    fn assistant_tool_call_turn_may_omit_content() {
        let call = ToolCallRequest::new("call_1", "web_search", serde_json::json!({"query": "q"}));
        let turn = Turn::assistant_tool_calls(ConversationId::new(), None, vec![call]);
        assert!(turn.content.is_none());
        assert!(turn.has_tool_calls());
    }
}
