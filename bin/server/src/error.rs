//! API error type and its HTTP mapping.
//!
//! Every handler failure funnels through [`ApiError`], which renders as a
//! JSON body of the form `{"success": false, "message": ..., "error": ...}`
//! with the matching status code. Missing and foreign resources collapse
//! into the same 404 so existence is never leaked.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use canvasmith_canvas::CanvasError;
use canvasmith_conversation::{StoreError, TurnError};
use std::fmt;

/// Errors surfaced to API clients.
#[derive(Debug)]
pub enum ApiError {
    /// Request validation failed.
    Validation { message: String },
    /// Missing, expired, or invalid credentials.
    Unauthorized,
    /// The resource does not exist or belongs to another user.
    NotFound { message: String },
    /// The request conflicts with existing state.
    Conflict { message: String },
    /// An upstream dependency failed.
    Upstream { message: String },
    /// An internal failure.
    Internal { message: String },
}

impl ApiError {
    /// Convenience constructor for internal failures.
    pub fn internal(e: impl fmt::Display) -> Self {
        Self::Internal {
            message: e.to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Upstream { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Unauthorized => "unauthorized",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Upstream { .. } => "upstream_error",
            Self::Internal { .. } => "internal_error",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { message }
            | Self::NotFound { message }
            | Self::Conflict { message }
            | Self::Upstream { message }
            | Self::Internal { message } => f.write_str(message),
            Self::Unauthorized => write!(f, "invalid or missing credentials"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = serde_json::json!({
            "success": false,
            "message": self.to_string(),
            "error": self.code(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<TurnError> for ApiError {
    fn from(e: TurnError) -> Self {
        match e {
            TurnError::EmptyMessage => Self::Validation {
                message: e.to_string(),
            },
            TurnError::NotFound { .. } => Self::NotFound {
                message: e.to_string(),
            },
            TurnError::Gateway { .. } => Self::Upstream {
                message: e.to_string(),
            },
            TurnError::Store { .. } => Self::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Internal {
            message: e.to_string(),
        }
    }
}

impl From<CanvasError> for ApiError {
    fn from(e: CanvasError) -> Self {
        match e {
            CanvasError::NotFound { .. } => Self::NotFound {
                message: e.to_string(),
            },
            CanvasError::InvalidFields { .. } => Self::Validation {
                message: e.to_string(),
            },
            CanvasError::StorageFailed { .. } => Self::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Internal {
            message: e.to_string(),
        }
    }
}

/// Failures that abort process startup.
///
/// Surfaced through the rootcause report returned by `main`.
#[derive(Debug)]
pub enum StartupError {
    /// Configuration could not be loaded.
    Config { reason: String },
    /// The database could not be reached.
    Database { reason: String },
    /// Migrations failed to apply.
    Migration { reason: String },
    /// The model gateway configuration was rejected.
    Gateway { reason: String },
    /// The listener could not be bound.
    Bind { reason: String },
    /// The server exited with an error.
    Serve { reason: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "failed to load configuration: {reason}"),
            Self::Database { reason } => write!(f, "failed to connect to database: {reason}"),
            Self::Migration { reason } => write!(f, "failed to run migrations: {reason}"),
            Self::Gateway { reason } => write!(f, "invalid gateway configuration: {reason}"),
            Self::Bind { reason } => write!(f, "failed to bind listener: {reason}"),
            Self::Serve { reason } => write!(f, "server error: {reason}"),
        }
    }
}

impl std::error::Error for StartupError {}
