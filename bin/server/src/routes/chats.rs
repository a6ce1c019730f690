//! Conversation listing and message history endpoints.

use crate::auth::CurrentUser;
use crate::db::conversation::ConversationRepository;
use crate::db::turn::TurnRepository;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use canvasmith_conversation::{ConversationStore, TurnRole, TurnStore};
use canvasmith_core::{ConversationId, TurnId};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ChatSummary {
    pub id: ConversationId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `GET /api/chats` — the caller's conversations, most recently updated first.
pub async fn list_chats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<ChatSummary>>, ApiError> {
    let conversations = ConversationRepository::new(state.db_pool.clone())
        .list_for_user(user.id)
        .await?;

    Ok(Json(
        conversations
            .into_iter()
            .map(|c| ChatSummary {
                id: c.id,
                title: c.title,
                created_at: c.created_at,
                updated_at: c.updated_at,
            })
            .collect(),
    ))
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: TurnId,
    pub role: TurnRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// `GET /api/chats/{id}/messages`
///
/// Returns the displayable transcript: user and assistant turns with text,
/// oldest first. Tool plumbing stays internal to the log.
pub async fn list_messages(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ConversationId>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    ConversationRepository::new(state.db_pool.clone())
        .find_by_id(id)
        .await?
        .filter(|c| c.user_id == user.id)
        .ok_or_else(|| ApiError::NotFound {
            message: format!("conversation not found: {id}"),
        })?;

    let turns = TurnRepository::new(state.db_pool.clone())
        .list_for_conversation(id)
        .await?;

    let messages = turns
        .into_iter()
        .filter(|t| matches!(t.role, TurnRole::User | TurnRole::Assistant))
        .filter_map(|t| {
            let content = t.content.filter(|c| !c.is_empty())?;
            Some(MessageView {
                id: t.id,
                role: t.role,
                content,
                created_at: t.created_at,
            })
        })
        .collect();

    Ok(Json(messages))
}
