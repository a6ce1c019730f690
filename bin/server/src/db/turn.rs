//! Postgres-backed turn log store.

use crate::db::decode_error;
use async_trait::async_trait;
use canvasmith_ai::ToolCallRequest;
use canvasmith_conversation::{StoreError, Turn, TurnRole, TurnStore};
use canvasmith_core::{ConversationId, TurnId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

/// Row type for turn queries.
#[derive(FromRow)]
struct TurnRow {
    id: String,
    conversation_id: String,
    role: String,
    content: Option<String>,
    tool_calls: Option<serde_json::Value>,
    tool_call_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TurnRow {
    fn try_into_turn(self) -> Result<Turn, sqlx::Error> {
        let id = TurnId::from_str(&self.id)
            .map_err(|e| decode_error(format!("invalid turn id '{}': {}", self.id, e)))?;
        let conversation_id = ConversationId::from_str(&self.conversation_id).map_err(|e| {
            decode_error(format!(
                "invalid conversation id '{}': {}",
                self.conversation_id, e
            ))
        })?;
        let role = TurnRole::from_str(&self.role)
            .map_err(|e| decode_error(format!("invalid turn role: {e}")))?;
        let tool_calls: Vec<ToolCallRequest> = match self.tool_calls {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| decode_error(format!("invalid tool_calls payload: {e}")))?,
            None => Vec::new(),
        };

        Ok(Turn {
            id,
            conversation_id,
            role,
            content: self.content,
            tool_calls,
            tool_call_id: self.tool_call_id,
            created_at: self.created_at,
        })
    }
}

fn store_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Decode(source) => StoreError::Corrupt {
            reason: source.to_string(),
        },
        other => StoreError::Backend {
            reason: other.to_string(),
        },
    }
}

/// Repository for turn log operations.
pub struct TurnRepository {
    pool: PgPool,
}

impl TurnRepository {
    /// Creates a new turn repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TurnStore for TurnRepository {
    async fn append(&self, turn: &Turn) -> Result<(), StoreError> {
        let tool_calls = if turn.tool_calls.is_empty() {
            None
        } else {
            Some(
                serde_json::to_value(&turn.tool_calls).map_err(|e| StoreError::Corrupt {
                    reason: format!("unserializable tool_calls: {e}"),
                })?,
            )
        };

        sqlx::query(
            r#"
            INSERT INTO turns (id, conversation_id, role, content, tool_calls, tool_call_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(turn.id.to_string())
        .bind(turn.conversation_id.to_string())
        .bind(turn.role.as_str())
        .bind(&turn.content)
        .bind(tool_calls)
        .bind(&turn.tool_call_id)
        .bind(turn.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn list_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Turn>, StoreError> {
        let rows: Vec<TurnRow> = sqlx::query_as(
            r#"
            SELECT id, conversation_id, role, content, tool_calls, tool_call_id, created_at
            FROM turns
            WHERE conversation_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(conversation_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter()
            .map(|r| r.try_into_turn().map_err(store_error))
            .collect()
    }
}
