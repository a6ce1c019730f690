//! Postgres-backed conversation store.

use crate::db::decode_error;
use async_trait::async_trait;
use canvasmith_conversation::{Conversation, ConversationStore, StoreError};
use canvasmith_core::{ConversationId, UserId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

/// Row type for conversation queries.
#[derive(FromRow)]
struct ConversationRow {
    id: String,
    user_id: String,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConversationRow {
    fn try_into_conversation(self) -> Result<Conversation, sqlx::Error> {
        let id = ConversationId::from_str(&self.id)
            .map_err(|e| decode_error(format!("invalid conversation id '{}': {}", self.id, e)))?;
        let user_id = UserId::from_str(&self.user_id)
            .map_err(|e| decode_error(format!("invalid user id '{}': {}", self.user_id, e)))?;
        Ok(Conversation {
            id,
            user_id,
            title: self.title,
            created_at: self.created_at,
            updated_at: self.updated_at,
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

/// Repository for conversation operations.
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    /// Creates a new conversation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for ConversationRepository {
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, user_id, title, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(conversation.id.to_string())
        .bind(conversation.user_id.to_string())
        .bind(&conversation.title)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: ConversationId) -> Result<Option<Conversation>, StoreError> {
        let row: Option<ConversationRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, title, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_conversation().map_err(store_error)?)),
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Conversation>, StoreError> {
        let rows: Vec<ConversationRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, title, created_at, updated_at
            FROM conversations
            WHERE user_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter()
            .map(|r| r.try_into_conversation().map_err(store_error))
            .collect()
    }

    async fn touch(&self, id: ConversationId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE conversations
            SET updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }
}
