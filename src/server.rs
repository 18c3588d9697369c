//! # Server Configuration
//!
//! Router setup and server startup for the sync service.

use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::crypto::CryptoKey;
use crate::handlers;
use crate::providers::CalendarProviders;
use crate::sync::SyncEngine;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub engine: SyncEngine,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, crypto_key: CryptoKey, providers: CalendarProviders) -> Self {
        let engine = SyncEngine::new(db.clone(), crypto_key, providers);
        Self { db, engine }
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/webhooks/google", post(handlers::webhooks::google_webhook))
        .route(
            "/webhooks/microsoft",
            post(handlers::webhooks::microsoft_webhook),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let crypto_key = match &config.crypto_key {
        Some(bytes) => CryptoKey::new(bytes.clone())?,
        None => return Err("ORBYT_CRYPTO_KEY must be set".into()),
    };
    let providers = CalendarProviders::from_config(&config);
    let state = AppState::new(Arc::new(db), crypto_key, providers);
    let app = create_app(state);

    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, profile = %config.profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
