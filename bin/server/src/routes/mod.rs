//! HTTP route table.

pub mod canvas;
pub mod chat;
pub mod chats;

use crate::auth;
use crate::state::AppState;
use axum::routing::{get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/register", post(auth::routes::register))
        .route("/api/auth/login", post(auth::routes::login))
        .route("/api/auth/me", get(auth::routes::me))
        .route("/api/chat", post(chat::chat))
        .route("/api/chats", get(chats::list_chats))
        .route("/api/chats/{id}/messages", get(chats::list_messages))
        .route("/api/canvas/public", get(canvas::list_public))
        .route("/api/canvas/{id}", get(canvas::fetch))
        .route("/api/canvas/{id}/fields", put(canvas::replace_fields))
        .route("/api/canvas/{id}/visibility", put(canvas::set_visibility))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
