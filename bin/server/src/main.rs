//! Process bootstrap: configuration, database, orchestrator wiring, router.

mod auth;
mod config;
mod db;
mod error;
mod routes;
mod state;

use crate::config::ServerConfig;
use crate::db::canvas::CanvasRepository;
use crate::db::conversation::ConversationRepository;
use crate::db::session::SessionRepository;
use crate::db::turn::TurnRepository;
use crate::error::StartupError;
use crate::state::AppState;
use canvasmith_ai::{OpenAiGateway, OpenAiGatewayConfig, SerperConfig, SerperSearch};
use canvasmith_conversation::TurnOrchestrator;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> canvasmith_core::Result<(), StartupError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().map_err(|e| StartupError::Config {
        reason: e.to_string(),
    })?;
    tracing::info!("Loaded configuration");

    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| StartupError::Database {
            reason: e.to_string(),
        })?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|e| StartupError::Migration {
            reason: e.to_string(),
        })?;

    // Expired sessions are swept once at startup and then on an interval.
    let sessions = SessionRepository::new(db_pool.clone());
    if let Err(e) = sweep_sessions(&sessions).await {
        tracing::warn!(error = %e, "startup session sweep failed");
    }
    let sweep_pool = db_pool.clone();
    let sweep_interval = std::time::Duration::from_secs(config.session.cleanup_interval_seconds);
    tokio::spawn(async move {
        let repo = SessionRepository::new(sweep_pool);
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = sweep_sessions(&repo).await {
                tracing::warn!(error = %e, "session sweep failed");
            }
        }
    });

    let gateway = OpenAiGateway::new(OpenAiGatewayConfig {
        base_url: config.llm.base_url.clone(),
        model: config.llm.model.clone(),
        api_key: config.llm.api_key.clone(),
        timeout_seconds: config.llm.timeout_seconds,
    })
    .map_err(|e| StartupError::Gateway {
        reason: e.to_string(),
    })?;
    let search = Arc::new(SerperSearch::new(SerperConfig {
        endpoint: config.search.endpoint.clone(),
        api_key: config.search.api_key.clone(),
    }));

    let mut orchestrator = TurnOrchestrator::new(
        Arc::new(ConversationRepository::new(db_pool.clone())),
        Arc::new(TurnRepository::new(db_pool.clone())),
        Arc::new(CanvasRepository::new(db_pool.clone())),
        Arc::new(gateway),
        search,
    );
    if let Some(prompt) = config.system_prompt.clone() {
        orchestrator = orchestrator.with_system_prompt(prompt);
    }

    let app_state = AppState::new(db_pool, Arc::new(orchestrator), config.session.clone());
    let app = routes::router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .map_err(|e| StartupError::Bind {
            reason: e.to_string(),
        })?;

    tracing::info!("listening on http://{}", config.bind_address);

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(|e| StartupError::Serve {
            reason: e.to_string(),
        })?;

    Ok(())
}

async fn sweep_sessions(repo: &SessionRepository) -> Result<(), sqlx::Error> {
    let deleted = repo.delete_expired().await?;
    if deleted > 0 {
        tracing::debug!(deleted_sessions = deleted, "removed expired sessions");
    }
    Ok(())
}
