//! Canvas record endpoints.

use crate::auth::CurrentUser;
use crate::db::canvas::CanvasRepository;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use canvasmith_canvas::{CanvasField, CanvasRecord, CanvasStore};
use canvasmith_core::CanvasRecordId;
use serde::Deserialize;

/// `GET /api/canvas/public` — all public records, newest first.
pub async fn list_public(
    State(state): State<AppState>,
) -> Result<Json<Vec<CanvasRecord>>, ApiError> {
    let records = CanvasRepository::new(state.db_pool.clone())
        .list_public()
        .await?;
    Ok(Json(records))
}

/// `GET /api/canvas/{id}`
///
/// Public records are readable by anyone; private records only by their
/// owner. A private record looks missing to everyone else.
pub async fn fetch(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Path(id): Path<CanvasRecordId>,
) -> Result<Json<CanvasRecord>, ApiError> {
    let not_found = || ApiError::NotFound {
        message: format!("canvas record not found: {id}"),
    };

    let record = CanvasRepository::new(state.db_pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(not_found)?;

    if !record.public && user.is_none_or(|u| u.id != record.user_id) {
        return Err(not_found());
    }

    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct ReplaceFieldsRequest {
    pub fields: Vec<CanvasField>,
}

/// `PUT /api/canvas/{id}/fields`
///
/// Full replace, identical semantics to the update tool: omitted tags are
/// gone afterwards.
pub async fn replace_fields(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<CanvasRecordId>,
    Json(request): Json<ReplaceFieldsRequest>,
) -> Result<Json<CanvasRecord>, ApiError> {
    if request.fields.is_empty() {
        return Err(ApiError::Validation {
            message: "fields must not be empty".to_string(),
        });
    }

    let record = CanvasRepository::new(state.db_pool.clone())
        .replace_fields(id, user.id, request.fields)
        .await?;

    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub public: bool,
}

/// `PUT /api/canvas/{id}/visibility`
///
/// Owner-only. Records are created private; this is the only way a record
/// enters or leaves the public listing.
pub async fn set_visibility(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<CanvasRecordId>,
    Json(request): Json<VisibilityRequest>,
) -> Result<Json<CanvasRecord>, ApiError> {
    let record = CanvasRepository::new(state.db_pool.clone())
        .set_public(id, user.id, request.public)
        .await?;

    Ok(Json(record))
}
