//! # API Handlers
//!
//! HTTP endpoint handlers for the sync service.

use axum::extract::State;
use axum::response::Json;
use serde_json::{Value as JsonValue, json};

use crate::error::{ApiError, ErrorType};
use crate::models::ServiceInfo;
use crate::server::AppState;

pub mod webhooks;

/// Root handler that returns basic service information
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness/readiness probe backed by a database round trip
pub async fn healthz(State(state): State<AppState>) -> Result<Json<JsonValue>, ApiError> {
    crate::db::health_check(&state.db)
        .await
        .map_err(|err: anyhow::Error| {
            tracing::error!(error = ?err, "Health check failed");
            ApiError::from(ErrorType::ServiceUnavailable)
        })?;

    Ok(Json(json!({ "status": "ok" })))
}
