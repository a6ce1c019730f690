//! Shared application state.

use crate::config::SessionConfig;
use canvasmith_conversation::TurnOrchestrator;
use sqlx::PgPool;
use std::sync::Arc;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db_pool: PgPool,
    /// The turn orchestrator.
    pub orchestrator: Arc<TurnOrchestrator>,
    /// Session issuing configuration.
    pub session: SessionConfig,
}

impl AppState {
    /// Creates the application state.
    #[must_use]
    pub fn new(db_pool: PgPool, orchestrator: Arc<TurnOrchestrator>, session: SessionConfig) -> Self {
        Self {
            db_pool,
            orchestrator,
            session,
        }
    }
}
