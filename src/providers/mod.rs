//! # Provider Clients
//!
//! HTTP clients for the external calendar providers. Base URLs are
//! injectable so tests can point them at a mock server.

pub mod google;
pub mod microsoft;

pub use google::{GoogleApiError, GoogleClient, GoogleEvent, GoogleEventsPage};
pub use microsoft::{GraphEvent, MicrosoftApiError, MicrosoftClient};

use crate::config::AppConfig;

/// The pair of provider clients the sync engine drives
#[derive(Debug, Clone)]
pub struct CalendarProviders {
    pub google: GoogleClient,
    pub microsoft: MicrosoftClient,
}

impl CalendarProviders {
    pub fn from_config(config: &AppConfig) -> Self {
        let http = reqwest::Client::new();
        Self {
            google: GoogleClient::new(
                http.clone(),
                config.google_oauth_base.clone(),
                config.google_api_base.clone(),
                config.google_client_id.clone().unwrap_or_default(),
                config.google_client_secret.clone().unwrap_or_default(),
            ),
            microsoft: MicrosoftClient::new(
                http,
                config.microsoft_login_base.clone(),
                config.microsoft_graph_base.clone(),
                config.microsoft_client_id.clone().unwrap_or_default(),
                config.microsoft_client_secret.clone().unwrap_or_default(),
            ),
        }
    }
}
