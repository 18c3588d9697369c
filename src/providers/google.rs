//! Google Calendar API client
//!
//! Covers the two calls the sync engine needs: refreshing an access token
//! at the OAuth token endpoint and listing calendar events, either
//! incrementally via syncToken or as a bounded full-window fetch.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Google API specific errors
#[derive(Debug, Error)]
pub enum GoogleApiError {
    /// HTTP 410 from events.list: the stored syncToken is no longer valid
    /// and the caller must fall back to a full sync.
    #[error("sync token expired")]
    SyncTokenExpired,

    #[error("token refresh failed with status {status}: {message}")]
    TokenRefresh { status: u16, message: String },

    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// A freshly minted access token
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedToken {
    pub access_token: String,
    pub expires_in: Option<i64>,
}

/// One page of events.list results
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleEventsPage {
    #[serde(default)]
    pub items: Vec<GoogleEvent>,
    #[serde(rename = "nextSyncToken")]
    pub next_sync_token: Option<String>,
}

/// A single Google Calendar event as returned by events.list
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleEvent {
    pub id: String,
    pub etag: Option<String>,
    pub status: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<GoogleEventTime>,
    pub end: Option<GoogleEventTime>,
    pub updated: Option<DateTime<Utc>>,
}

/// Google's start/end wrapper: dateTime for timed events, date for all-day
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleEventTime {
    #[serde(rename = "dateTime")]
    pub date_time: Option<DateTime<Utc>>,
    pub date: Option<NaiveDate>,
}

impl GoogleEventTime {
    /// Resolves to a concrete instant plus the all-day flag. All-day events
    /// carry only a date; it anchors at midnight UTC.
    pub fn resolve(&self) -> Option<(DateTime<Utc>, bool)> {
        if let Some(dt) = self.date_time {
            return Some((dt, false));
        }
        self.date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| (naive.and_utc(), true))
    }
}

/// Client for the Google OAuth token endpoint and Calendar Events API
#[derive(Debug, Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    oauth_base: String,
    api_base: String,
    client_id: String,
    client_secret: String,
}

impl GoogleClient {
    pub fn new(
        http: reqwest::Client,
        oauth_base: String,
        api_base: String,
        client_id: String,
        client_secret: String,
    ) -> Self {
        Self {
            http,
            oauth_base,
            api_base,
            client_id,
            client_secret,
        }
    }

    /// Exchanges a refresh token for a fresh access token
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<RefreshedToken, GoogleApiError> {
        let url = format!("{}/token", self.oauth_base);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GoogleApiError::TokenRefresh {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Incremental events.list using the stored syncToken. A single page of
    /// up to 250 items; HTTP 410 surfaces as [`GoogleApiError::SyncTokenExpired`].
    pub async fn list_events_incremental(
        &self,
        access_token: &str,
        sync_token: &str,
    ) -> Result<GoogleEventsPage, GoogleApiError> {
        let url = format!("{}/calendars/primary/events", self.api_base);
        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("maxResults", "250"), ("syncToken", sync_token)])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 410 {
            return Err(GoogleApiError::SyncTokenExpired);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GoogleApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Full-window events.list used when the syncToken has expired: expanded
    /// single events ordered by start time, up to 500 items.
    pub async fn list_events_window(
        &self,
        access_token: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<GoogleEventsPage, GoogleApiError> {
        let url = format!("{}/calendars/primary/events", self.api_base);
        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("timeMin", time_min.to_rfc3339().as_str()),
                ("timeMax", time_max.to_rfc3339().as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", "500"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GoogleApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_timed_event() {
        let event: GoogleEvent = serde_json::from_value(serde_json::json!({
            "id": "evt-1",
            "etag": "\"etag-1\"",
            "status": "confirmed",
            "summary": "Dentist",
            "start": {"dateTime": "2026-03-01T10:00:00Z"},
            "end": {"dateTime": "2026-03-01T11:00:00Z"},
            "updated": "2026-02-28T09:00:00Z"
        }))
        .unwrap();

        let (start, all_day) = event.start.unwrap().resolve().unwrap();
        assert!(!all_day);
        assert_eq!(start.to_rfc3339(), "2026-03-01T10:00:00+00:00");
    }

    #[test]
    fn parses_all_day_event() {
        let time: GoogleEventTime =
            serde_json::from_value(serde_json::json!({"date": "2026-03-01"})).unwrap();

        let (start, all_day) = time.resolve().unwrap();
        assert!(all_day);
        assert_eq!(start.to_rfc3339(), "2026-03-01T00:00:00+00:00");
    }

    #[test]
    fn unresolvable_start_is_none() {
        let time: GoogleEventTime = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(time.resolve().is_none());
    }

    #[test]
    fn parses_page_without_items() {
        let page: GoogleEventsPage =
            serde_json::from_value(serde_json::json!({"nextSyncToken": "tok-2"})).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next_sync_token.as_deref(), Some("tok-2"));
    }
}
