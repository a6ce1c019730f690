//! The streaming chat endpoint.

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use canvasmith_conversation::TurnInput;
use canvasmith_core::ConversationId;
use futures::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    /// Continue this conversation (`conversationId` on the wire); omit to
    /// start a new one.
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
}

/// `POST /api/chat`
///
/// Validation, decision, and tool execution complete before the response
/// starts, so their failures map to plain HTTP statuses. Once the SSE stream
/// is open, failures arrive as an `{"error": ...}` frame followed by close.
pub async fn chat(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + Send>, ApiError> {
    let frames = state
        .orchestrator
        .start(TurnInput {
            user_id: user.id,
            conversation_id: request.conversation_id,
            message: request.message,
        })
        .await?;

    let stream = ReceiverStream::new(frames).map(|frame| {
        let data = serde_json::to_string(&frame).unwrap_or_default();
        Ok(Event::default().data(data))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_takes_camel_case_conversation_id() {
        let id = ConversationId::new();
        let raw = format!(r#"{{"message": "hi", "conversationId": "{}"}}"#, id.as_ulid());
        let request: ChatRequest = serde_json::from_str(&raw).expect("deserialize");

        assert_eq!(request.message, "hi");
        assert_eq!(request.conversation_id, Some(id));
    }

    #[test]
    fn snake_case_key_does_not_bind() {
        let id = ConversationId::new();
        let raw = format!(r#"{{"message": "hi", "conversation_id": "{}"}}"#, id.as_ulid());
        let request: ChatRequest = serde_json::from_str(&raw).expect("deserialize");
        assert!(request.conversation_id.is_none());
    }

    #[test]
    fn conversation_id_defaults_to_none() {
        let request: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).expect("deserialize");
        assert!(request.conversation_id.is_none());
    }
}
