//! Microsoft Graph API client
//!
//! Confidential-client token refresh against the v2 token endpoint and
//! single-event fetches from Graph. Graph omits the access token from some
//! token responses (consent revoked, tenant policy); that case is surfaced
//! as `Ok(None)` so callers can drop the notification quietly.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

const CALENDARS_SCOPE: &str = "https://graph.microsoft.com/Calendars.ReadWrite offline_access";
const EVENT_SELECT: &str =
    "id,subject,body,location,start,end,isAllDay,showAs,lastModifiedDateTime,changeKey";

/// Microsoft Graph specific errors
#[derive(Debug, Error)]
pub enum MicrosoftApiError {
    #[error("token refresh failed with status {status}: {message}")]
    TokenRefresh { status: u16, message: String },

    #[error("Graph request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// A freshly minted access token
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    pub access_token: String,
    pub expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// A Graph calendar event, restricted to the fields the engine selects
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEvent {
    pub id: String,
    pub subject: Option<String>,
    pub body: Option<GraphItemBody>,
    pub location: Option<GraphLocation>,
    pub start: Option<GraphDateTimeTimeZone>,
    pub end: Option<GraphDateTimeTimeZone>,
    #[serde(default)]
    pub is_all_day: bool,
    pub show_as: Option<String>,
    pub last_modified_date_time: Option<DateTime<Utc>>,
    pub change_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphItemBody {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphLocation {
    pub display_name: Option<String>,
}

/// Graph's dateTime/timeZone pair. The dateTime is wall-clock with a
/// seven-digit fraction and no offset.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDateTimeTimeZone {
    pub date_time: Option<String>,
    pub time_zone: Option<String>,
}

impl GraphDateTimeTimeZone {
    /// Resolves the wall-clock value to an instant. Anything other than an
    /// explicit non-UTC zone is read as UTC; the engine requests UTC via
    /// the Prefer header so other zones do not occur in practice.
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        let raw = self.date_time.as_deref()?;
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Maps Graph's showAs field onto the local event status vocabulary
pub fn map_show_as(show_as: Option<&str>) -> &'static str {
    match show_as {
        Some("tentative") => "tentative",
        Some("free") => "cancelled",
        _ => "confirmed",
    }
}

/// Client for the Microsoft identity platform and Graph API
#[derive(Debug, Clone)]
pub struct MicrosoftClient {
    http: reqwest::Client,
    login_base: String,
    graph_base: String,
    client_id: String,
    client_secret: String,
}

impl MicrosoftClient {
    pub fn new(
        http: reqwest::Client,
        login_base: String,
        graph_base: String,
        client_id: String,
        client_secret: String,
    ) -> Self {
        Self {
            http,
            login_base,
            graph_base,
            client_id,
            client_secret,
        }
    }

    /// Exchanges a refresh token at the common v2 token endpoint. Returns
    /// `Ok(None)` when the response carries no access token.
    pub async fn acquire_token_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<RefreshedToken>, MicrosoftApiError> {
        let url = format!("{}/common/oauth2/v2.0/token", self.login_base);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
                ("scope", CALENDARS_SCOPE),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MicrosoftApiError::TokenRefresh {
                status: status.as_u16(),
                message,
            });
        }

        let body: TokenResponse = response.json().await?;
        Ok(body.access_token.map(|access_token| RefreshedToken {
            access_token,
            expires_in: body.expires_in,
        }))
    }

    /// Fetches one event with the fixed $select projection
    pub async fn get_event(
        &self,
        access_token: &str,
        event_id: &str,
    ) -> Result<GraphEvent, MicrosoftApiError> {
        let url = format!("{}/me/events/{}", self.graph_base, event_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .header("Prefer", "outlook.timezone=\"UTC\"")
            .query(&[("$select", EVENT_SELECT)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MicrosoftApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
