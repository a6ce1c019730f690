//! Postgres-backed canvas record store.

use crate::db::decode_error;
use async_trait::async_trait;
use canvasmith_canvas::{CanvasError, CanvasField, CanvasRecord, CanvasStore};
use canvasmith_core::{CanvasRecordId, UserId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

/// Row type for canvas record queries.
#[derive(FromRow)]
struct CanvasRow {
    id: String,
    user_id: String,
    public: bool,
    fields: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CanvasRow {
    fn try_into_record(self) -> Result<CanvasRecord, sqlx::Error> {
        let id = CanvasRecordId::from_str(&self.id)
            .map_err(|e| decode_error(format!("invalid canvas record id '{}': {}", self.id, e)))?;
        let user_id = UserId::from_str(&self.user_id)
            .map_err(|e| decode_error(format!("invalid user id '{}': {}", self.user_id, e)))?;
        let fields: Vec<CanvasField> = serde_json::from_value(self.fields)
            .map_err(|e| decode_error(format!("invalid fields payload: {e}")))?;

        Ok(CanvasRecord {
            id,
            user_id,
            public: self.public,
            fields,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn storage_error(e: sqlx::Error) -> CanvasError {
    CanvasError::StorageFailed {
        reason: e.to_string(),
    }
}

/// Repository for canvas record operations.
pub struct CanvasRepository {
    pool: PgPool,
}

impl CanvasRepository {
    /// Creates a new canvas repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CanvasStore for CanvasRepository {
    async fn create(&self, record: &CanvasRecord) -> Result<(), CanvasError> {
        let fields = serde_json::to_value(&record.fields).map_err(|e| CanvasError::InvalidFields {
            reason: format!("unserializable fields: {e}"),
        })?;

        sqlx::query(
            r#"
            INSERT INTO canvas_records (id, user_id, public, fields, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.user_id.to_string())
        .bind(record.public)
        .bind(fields)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: CanvasRecordId) -> Result<Option<CanvasRecord>, CanvasError> {
        let row: Option<CanvasRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, public, fields, created_at, updated_at
            FROM canvas_records
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        match row {
            Some(r) => Ok(Some(r.try_into_record().map_err(storage_error)?)),
            None => Ok(None),
        }
    }

    async fn list_public(&self) -> Result<Vec<CanvasRecord>, CanvasError> {
        let rows: Vec<CanvasRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, public, fields, created_at, updated_at
            FROM canvas_records
            WHERE public
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter()
            .map(|r| r.try_into_record().map_err(storage_error))
            .collect()
    }

    async fn replace_fields(
        &self,
        id: CanvasRecordId,
        owner: UserId,
        fields: Vec<CanvasField>,
    ) -> Result<CanvasRecord, CanvasError> {
        let payload = serde_json::to_value(&fields).map_err(|e| CanvasError::InvalidFields {
            reason: format!("unserializable fields: {e}"),
        })?;

        // Ownership is part of the predicate so a foreign record reads as
        // missing.
        let row: Option<CanvasRow> = sqlx::query_as(
            r#"
            UPDATE canvas_records
            SET fields = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, public, fields, created_at, updated_at
            "#,
        )
        .bind(id.to_string())
        .bind(owner.to_string())
        .bind(payload)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        match row {
            Some(r) => r.try_into_record().map_err(storage_error),
            None => Err(CanvasError::NotFound { id }),
        }
    }

    async fn set_public(
        &self,
        id: CanvasRecordId,
        owner: UserId,
        public: bool,
    ) -> Result<CanvasRecord, CanvasError> {
        let row: Option<CanvasRow> = sqlx::query_as(
            r#"
            UPDATE canvas_records
            SET public = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, public, fields, created_at, updated_at
            "#,
        )
        .bind(id.to_string())
        .bind(owner.to_string())
        .bind(public)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        match row {
            Some(r) => r.try_into_record().map_err(storage_error),
            None => Err(CanvasError::NotFound { id }),
        }
    }
}
