//! Registration, login, and account lookup handlers.

use crate::auth::{hash_password, verify_password, CurrentUser};
use crate::db::session::{Session, SessionRepository};
use crate::db::user::{User, UserRepository};
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use canvasmith_core::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// User payload returned by auth endpoints; never carries the hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = request.username.trim().to_string();
    let email = request.email.trim().to_lowercase();
    if username.is_empty() || email.is_empty() || request.password.is_empty() {
        return Err(ApiError::Validation {
            message: "username, email, and password are required".to_string(),
        });
    }

    let users = UserRepository::new(state.db_pool.clone());
    let user = User::new(username, email, hash_password(&request.password)?);

    if let Err(e) = users.create(&user).await {
        if e.as_database_error()
            .is_some_and(|db| db.is_unique_violation())
        {
            return Err(ApiError::Conflict {
                message: "an account with that email or username already exists".to_string(),
            });
        }
        return Err(e.into());
    }

    tracing::info!(user = %user.id, "registered new user");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let users = UserRepository::new(state.db_pool.clone());
    let email = request.email.trim().to_lowercase();

    let Some(user) = users.find_by_email(&email).await? else {
        // Burn comparable time so a missing account is indistinguishable
        // from a wrong password.
        let _ = verify_password(&request.password, DUMMY_HASH);
        return Err(ApiError::Unauthorized);
    };

    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let session = Session::issue(user.id, state.session.duration_minutes);
    SessionRepository::new(state.db_pool.clone())
        .create(&session)
        .await?;

    tracing::info!(user = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        token: session.token,
        user: UserResponse::from(user),
    }))
}

/// `GET /api/auth/me`
///
/// The account behind the presented bearer token. A valid session whose user
/// row has disappeared reads as unauthorized, not as an internal error.
pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<UserResponse>, ApiError> {
    let account = UserRepository::new(state.db_pool.clone())
        .find_by_id(user.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(UserResponse::from(account)))
}

// Argon2id hash of an unused throwaway value.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$gZiV/M1gPc22ElAH/Jh1Hw$CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_payload_never_carries_the_hash() {
        let user = User::new("taylor", "taylor@example.com", "$argon2id$not-a-real-hash");
        let json = serde_json::to_value(UserResponse::from(user)).expect("serialize");

        assert_eq!(json["username"], "taylor");
        assert_eq!(json["email"], "taylor@example.com");
        assert!(json.get("password_hash").is_none());
    }
}
