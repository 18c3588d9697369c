//! # Webhook Handlers
//!
//! Entry points for Google Calendar channel notifications and Microsoft
//! Graph change notifications. Both providers treat the response purely as
//! an acknowledgement; all reconciliation output lands in the database.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;
use crate::server::AppState;
use crate::sync::MicrosoftNotification;

/// Graph subscription validation handshake query parameter
#[derive(Debug, Deserialize)]
pub struct MicrosoftWebhookQuery {
    #[serde(rename = "validationToken")]
    pub validation_token: Option<String>,
}

/// Body of a Graph change notification delivery
#[derive(Debug, Deserialize)]
pub struct MicrosoftBatchPayload {
    #[serde(default)]
    pub value: Vec<MicrosoftNotification>,
}

fn required_header(headers: &HeaderMap, name: &str) -> Result<String, ApiError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                &format!("missing or invalid {} header", name),
            )
        })
}

/// Google Calendar push notification. All event data arrives via headers;
/// the body is empty.
pub async fn google_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let channel_id = required_header(&headers, "X-Goog-Channel-ID")?;
    let resource_id = required_header(&headers, "X-Goog-Resource-ID")?;

    debug!(channel_id, resource_id, "Received Google webhook");

    state
        .engine
        .handle_google_webhook(&channel_id, &resource_id)
        .await?;

    Ok(StatusCode::OK)
}

/// Microsoft Graph change notification delivery.
///
/// Graph first validates a new subscription by sending a validationToken
/// query parameter that must be echoed back as plain text. Regular
/// deliveries carry a `value` array of notifications; the batch is
/// processed with per-notification error isolation and acknowledged 202.
pub async fn microsoft_webhook(
    State(state): State<AppState>,
    Query(query): Query<MicrosoftWebhookQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    if let Some(token) = query.validation_token {
        debug!("Answering Microsoft subscription validation handshake");
        return Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain")],
            token,
        )
            .into_response());
    }

    let payload: MicrosoftBatchPayload = serde_json::from_slice(&body).map_err(|err| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            &format!("Invalid notification payload: {}", err),
        )
    })?;

    debug!(
        notifications = payload.value.len(),
        "Received Microsoft webhook batch"
    );

    state.engine.handle_microsoft_batch(&payload.value).await;

    Ok(StatusCode::ACCEPTED.into_response())
}
