//! Bearer session entity and repository.

use crate::db::decode_error;
use canvasmith_core::UserId;
use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

/// An opaque bearer session.
#[derive(Debug, Clone)]
pub struct Session {
    /// The bearer token presented by the client.
    pub token: String,
    /// The user this session authenticates.
    pub user_id: UserId,
    /// When the session was issued.
    pub created_at: DateTime<Utc>,
    /// When the session stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Issues a new session for a user with a fresh ULID token.
    #[must_use]
    pub fn issue(user_id: UserId, duration_minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            token: ulid::Ulid::new().to_string(),
            user_id,
            created_at: now,
            expires_at: now + Duration::minutes(duration_minutes),
        }
    }
}

/// Row type for session queries.
#[derive(FromRow)]
struct SessionRow {
    token: String,
    user_id: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionRow {
    fn try_into_session(self) -> Result<Session, sqlx::Error> {
        let user_id = UserId::from_str(&self.user_id)
            .map_err(|e| decode_error(format!("invalid user id '{}': {}", self.user_id, e)))?;
        Ok(Session {
            token: self.token,
            user_id,
            created_at: self.created_at,
            expires_at: self.expires_at,
        })
    }
}

/// Repository for session operations.
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Creates a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persists a new session.
    pub async fn create(&self, session: &Session) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&session.token)
        .bind(session.user_id.to_string())
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Finds a non-expired session by token.
    pub async fn find_valid(&self, token: &str) -> Result<Option<Session>, sqlx::Error> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT token, user_id, created_at, expires_at
            FROM sessions
            WHERE token = $1 AND expires_at > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_session()?)),
            None => Ok(None),
        }
    }

    /// Deletes expired sessions, returning how many were removed.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
