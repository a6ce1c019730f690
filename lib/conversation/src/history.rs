//! Gateway context reconstruction from the turn log.
//!
//! Reconstruction is a pure fold over an ordered turn slice. Running it twice
//! on the same log yields the same result; nothing here touches storage or
//! the clock.

use crate::turn::{Turn, TurnRole};
use canvasmith_ai::ChatMessage;
use canvasmith_core::CanvasRecordId;
use serde_json::Value as JsonValue;
use std::collections::HashSet;

/// The reconstructed gateway context for a conversation.
#[derive(Debug, Clone, Default)]
pub struct History {
    /// Replayable messages in log order, without the system prompt.
    pub messages: Vec<ChatMessage>,
    /// The canvas record the conversation last wrote successfully, if any.
    pub active_record: Option<CanvasRecordId>,
}

/// Folds an ordered turn slice into gateway context.
///
/// Drop rules:
/// - assistant turns with neither text nor tool calls are dropped;
/// - tool turns without an invocation id are dropped;
/// - tool turns whose invocation id does not answer the most recent
///   assistant turn carrying tool calls are dropped.
///
/// The active record is derived by scanning tool outcomes chronologically:
/// each successful outcome reporting a `record_id` overwrites the running
/// value, so the last writer wins.
#[must_use]
pub fn reconstruct(turns: &[Turn]) -> History {
    let mut messages = Vec::with_capacity(turns.len());
    let mut active_record = None;
    let mut open_calls: HashSet<&str> = HashSet::new();

    for turn in turns {
        match turn.role {
            TurnRole::User => {
                open_calls.clear();
                messages.push(ChatMessage::user(turn.content.clone().unwrap_or_default()));
            }
            TurnRole::Assistant => {
                if turn.has_tool_calls() {
                    open_calls = turn.tool_calls.iter().map(|c| c.id.as_str()).collect();
                    messages.push(ChatMessage::assistant_tool_calls(
                        turn.content.clone().filter(|c| !c.is_empty()),
                        turn.tool_calls.clone(),
                    ));
                } else {
                    open_calls.clear();
                    match &turn.content {
                        Some(text) if !text.is_empty() => {
                            messages.push(ChatMessage::assistant(text.clone()));
                        }
                        _ => {}
                    }
                }
            }
            TurnRole::Tool => {
                let Some(call_id) = turn.tool_call_id.as_deref() else {
                    continue;
                };
                if !open_calls.contains(call_id) {
                    continue;
                }
                let content = turn.content.clone().unwrap_or_default();
                if let Some(record_id) = outcome_record_id(&content) {
                    active_record = Some(record_id);
                }
                messages.push(ChatMessage::tool(call_id, content));
            }
            // The system prompt is configuration, not log data.
            TurnRole::System => {}
        }
    }

    History {
        messages,
        active_record,
    }
}

fn outcome_record_id(content: &str) -> Option<CanvasRecordId> {
    let outcome: JsonValue = serde_json::from_str(content).ok()?;
    if outcome.get("status")?.as_str()? != "ok" {
        return None;
    }
    outcome.get("record_id")?.as_str()?.parse().ok()
}
