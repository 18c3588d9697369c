//! Shared helpers for integration tests: in-memory database setup, provider
//! clients pointed at a wiremock server, and seed data builders.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use migration::{Migrator, MigratorTrait};
use orbyt_sync::config::AppConfig;
use orbyt_sync::crypto::{CryptoKey, encrypt_account_tokens};
use orbyt_sync::db::init_pool;
use orbyt_sync::models::{
    connected_account, event, external_event, household, household_member, webhook_subscription,
};
use orbyt_sync::providers::{CalendarProviders, google::GoogleClient, microsoft::MicrosoftClient};
use orbyt_sync::server::AppState;
use orbyt_sync::sync::SyncEngine;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Arc;
use uuid::Uuid;

pub fn test_key() -> CryptoKey {
    CryptoKey::new(vec![7u8; 32]).expect("valid test key")
}

pub async fn test_db() -> Arc<DatabaseConnection> {
    let config = AppConfig::default();
    let db = init_pool(&config).await.expect("init in-memory db");
    Migrator::up(&db, None).await.expect("apply migrations");
    Arc::new(db)
}

/// Provider clients with every base URL pointed at the mock server
pub fn mock_providers(mock_uri: &str) -> CalendarProviders {
    let http = reqwest::Client::new();
    CalendarProviders {
        google: GoogleClient::new(
            http.clone(),
            mock_uri.to_string(),
            mock_uri.to_string(),
            "google-client-id".to_string(),
            "google-client-secret".to_string(),
        ),
        microsoft: MicrosoftClient::new(
            http,
            mock_uri.to_string(),
            mock_uri.to_string(),
            "microsoft-client-id".to_string(),
            "microsoft-client-secret".to_string(),
        ),
    }
}

pub fn test_engine(db: Arc<DatabaseConnection>, mock_uri: &str) -> SyncEngine {
    SyncEngine::new(db, test_key(), mock_providers(mock_uri))
}

pub fn test_app_state(db: Arc<DatabaseConnection>, mock_uri: &str) -> AppState {
    AppState::new(db, test_key(), mock_providers(mock_uri))
}

pub async fn seed_household(db: &DatabaseConnection) -> Uuid {
    let id = Uuid::new_v4();
    household::ActiveModel {
        id: Set(id),
        name: Set(Some("Test household".to_string())),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .expect("insert household");
    id
}

pub async fn seed_member(db: &DatabaseConnection, household_id: Uuid, user_id: Uuid) {
    household_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        household_id: Set(household_id),
        user_id: Set(user_id),
        role: Set("member".to_string()),
        joined_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .expect("insert household member");
}

/// Inserts a connected account with an encrypted refresh token
pub async fn seed_account(
    db: &DatabaseConnection,
    user_id: Uuid,
    provider: &str,
    refresh_token: Option<&str>,
    sync_token: Option<&str>,
) -> connected_account::Model {
    let now = Utc::now();
    let template = connected_account::Model {
        id: Uuid::new_v4(),
        user_id,
        provider: provider.to_string(),
        status: "active".to_string(),
        access_token_ciphertext: None,
        refresh_token_ciphertext: None,
        token_expires_at: None,
        sync_token: sync_token.map(|t| t.to_string()),
        last_sync_at: None,
        sync_error: None,
        created_at: now.into(),
        updated_at: now.into(),
    };

    let (_, refresh_ciphertext) =
        encrypt_account_tokens(&test_key(), &template, None, refresh_token)
            .expect("encrypt tokens");

    connected_account::ActiveModel {
        id: Set(template.id),
        user_id: Set(template.user_id),
        provider: Set(template.provider.clone()),
        status: Set(template.status.clone()),
        access_token_ciphertext: Set(None),
        refresh_token_ciphertext: Set(refresh_ciphertext),
        token_expires_at: Set(None),
        sync_token: Set(template.sync_token.clone()),
        last_sync_at: Set(None),
        sync_error: Set(None),
        created_at: Set(template.created_at),
        updated_at: Set(template.updated_at),
    }
    .insert(db)
    .await
    .expect("insert connected account")
}

pub async fn seed_subscription(
    db: &DatabaseConnection,
    connected_account_id: Uuid,
    subscription_id: &str,
    resource_id: Option<&str>,
    sync_token: Option<&str>,
    is_active: bool,
) -> webhook_subscription::Model {
    let now = Utc::now();
    webhook_subscription::ActiveModel {
        id: Set(Uuid::new_v4()),
        connected_account_id: Set(connected_account_id),
        subscription_id: Set(subscription_id.to_string()),
        resource_id: Set(resource_id.map(|r| r.to_string())),
        sync_token: Set(sync_token.map(|t| t.to_string())),
        is_active: Set(is_active),
        expires_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await
    .expect("insert webhook subscription")
}

/// Inserts a native event with explicit bookkeeping timestamps, which the
/// conflict tests manipulate directly.
pub async fn seed_native_event(
    db: &DatabaseConnection,
    household_id: Uuid,
    title: &str,
    updated_at: DateTime<Utc>,
    last_synced_at: Option<DateTime<Utc>>,
) -> event::Model {
    let now = Utc::now();
    event::ActiveModel {
        id: Set(Uuid::new_v4()),
        household_id: Set(household_id),
        title: Set(title.to_string()),
        description: Set(None),
        location: Set(None),
        start_at: Set(now.into()),
        end_at: Set((now + chrono::Duration::hours(1)).into()),
        all_day: Set(false),
        last_synced_at: Set(last_synced_at.map(Into::into)),
        created_at: Set((now - chrono::Duration::days(30)).into()),
        updated_at: Set(updated_at.into()),
    }
    .insert(db)
    .await
    .expect("insert native event")
}

/// Inserts an external event row, optionally linked to a native event
pub async fn seed_external_event(
    db: &DatabaseConnection,
    connected_account_id: Uuid,
    user_id: Uuid,
    external_id: &str,
    title: &str,
    last_updated_external: Option<DateTime<Utc>>,
    orbyt_event_id: Option<Uuid>,
) -> external_event::Model {
    let now = Utc::now();
    external_event::ActiveModel {
        id: Set(Uuid::new_v4()),
        connected_account_id: Set(connected_account_id),
        user_id: Set(user_id),
        external_id: Set(external_id.to_string()),
        title: Set(title.to_string()),
        description: Set(None),
        location: Set(None),
        start_at: Set(now.into()),
        end_at: Set((now + chrono::Duration::hours(1)).into()),
        all_day: Set(false),
        status: Set("confirmed".to_string()),
        metadata: Set(None),
        last_updated_external: Set(last_updated_external.map(Into::into)),
        etag: Set(None),
        orbyt_event_id: Set(orbyt_event_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await
    .expect("insert external event")
}
