//! The reconciliation engine
//!
//! One entry point per provider notification. Each invocation runs the
//! full refresh-fetch-upsert cycle for the named account; safety under
//! concurrent deliveries comes from idempotent upserts and monotonic
//! sync-token advancement, not locking.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::sync::Arc;

use crate::crypto::CryptoKey;
use crate::models::{connected_account, webhook_subscription};
use crate::providers::{CalendarProviders, GoogleApiError, GoogleEvent, GoogleEventsPage};
use crate::providers::microsoft::map_show_as;
use crate::repositories::{
    ConnectedAccountRepository, ExternalEventRepository, NewExternalEvent,
    WebhookSubscriptionRepository,
};
use crate::sync::reconcile::ConflictResolver;

/// Full-sync horizon used when the incremental sync token has expired
const FULL_SYNC_WINDOW_DAYS: i64 = 90;

/// One entry of a Microsoft Graph change notification delivery
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicrosoftNotification {
    pub subscription_id: String,
    pub change_type: String,
    pub resource: String,
    pub client_state: Option<String>,
}

/// Drives reconciliation of provider push notifications
#[derive(Clone)]
pub struct SyncEngine {
    accounts: ConnectedAccountRepository,
    subscriptions: WebhookSubscriptionRepository,
    external_events: ExternalEventRepository,
    resolver: ConflictResolver,
    providers: CalendarProviders,
}

impl SyncEngine {
    pub fn new(
        db: Arc<DatabaseConnection>,
        crypto_key: CryptoKey,
        providers: CalendarProviders,
    ) -> Self {
        Self {
            accounts: ConnectedAccountRepository::new(db.clone(), crypto_key),
            subscriptions: WebhookSubscriptionRepository::new(db.clone()),
            external_events: ExternalEventRepository::new(db.clone()),
            resolver: ConflictResolver::new(db),
            providers,
        }
    }

    /// Handles one Google Calendar push notification.
    ///
    /// Unknown channels, inactive subscriptions, disabled accounts, spoofed
    /// resource ids and missing refresh tokens are dropped with a warning;
    /// provider and database failures propagate to the caller.
    pub async fn handle_google_webhook(&self, channel_id: &str, resource_id: &str) -> Result<()> {
        let Some(subscription) = self.lookup_active_subscription(channel_id).await? else {
            return Ok(());
        };

        if let Some(expected) = subscription.resource_id.as_deref()
            && expected != resource_id
        {
            tracing::warn!(
                channel_id,
                resource_id,
                expected,
                "Resource id mismatch on Google webhook, dropping notification"
            );
            return Ok(());
        }

        let Some(account) = self.lookup_active_account(&subscription).await? else {
            return Ok(());
        };

        self.sync_google_account(&account, &subscription).await
    }

    async fn sync_google_account(
        &self,
        account: &connected_account::Model,
        subscription: &webhook_subscription::Model,
    ) -> Result<()> {
        let (_, refresh_token) = self.accounts.decrypt_tokens(account)?;
        let Some(refresh_token) = refresh_token else {
            tracing::warn!(
                account_id = %account.id,
                "No refresh token on account, skipping Google sync"
            );
            return Ok(());
        };

        let refreshed = self
            .providers
            .google
            .refresh_access_token(&refresh_token)
            .await
            .context("Google token refresh failed")?;
        let expires_at = expiry_from_seconds(Utc::now(), refreshed.expires_in);
        let account = self
            .accounts
            .store_refreshed_access_token(account, &refreshed.access_token, expires_at)
            .await?;

        // Subscription-scoped token wins over the account-level copy.
        let sync_token = subscription
            .sync_token
            .clone()
            .or_else(|| account.sync_token.clone());

        let page = self
            .fetch_google_events(&refreshed.access_token, sync_token.as_deref())
            .await?;

        for item in &page.items {
            self.apply_google_event(&account, item).await?;
        }

        if let Some(next_token) = page.next_sync_token.as_deref() {
            self.subscriptions
                .update_sync_token(&subscription.id, next_token)
                .await?;
        }
        self.accounts
            .mark_synced(&account.id, page.next_sync_token.as_deref())
            .await?;

        Ok(())
    }

    /// Incremental fetch when a sync token exists, full-window fetch when it
    /// is absent or rejected with 410.
    async fn fetch_google_events(
        &self,
        access_token: &str,
        sync_token: Option<&str>,
    ) -> Result<GoogleEventsPage> {
        if let Some(token) = sync_token {
            match self
                .providers
                .google
                .list_events_incremental(access_token, token)
                .await
            {
                Ok(page) => return Ok(page),
                Err(GoogleApiError::SyncTokenExpired) => {
                    tracing::info!("Google sync token expired, falling back to full sync");
                }
                Err(err) => return Err(err).context("Google incremental sync failed"),
            }
        }

        let now = Utc::now();
        self.providers
            .google
            .list_events_window(access_token, now, now + Duration::days(FULL_SYNC_WINDOW_DAYS))
            .await
            .context("Google full sync failed")
    }

    async fn apply_google_event(
        &self,
        account: &connected_account::Model,
        item: &GoogleEvent,
    ) -> Result<()> {
        if item.status.as_deref() == Some("cancelled") {
            self.external_events
                .mark_cancelled(&account.id, &item.id)
                .await?;
            return Ok(());
        }

        let Some(title) = item.summary.clone() else {
            tracing::debug!(external_id = %item.id, "Google event without summary, skipping");
            return Ok(());
        };
        let Some((start_at, all_day)) = item.start.as_ref().and_then(|s| s.resolve()) else {
            tracing::debug!(external_id = %item.id, "Google event without start, skipping");
            return Ok(());
        };
        let end_at = item
            .end
            .as_ref()
            .and_then(|e| e.resolve())
            .map(|(end, _)| end)
            .unwrap_or(start_at);

        let status = match item.status.as_deref() {
            Some("tentative") => "tentative",
            _ => "confirmed",
        };

        let upserted = self
            .external_events
            .upsert(NewExternalEvent {
                connected_account_id: account.id,
                user_id: account.user_id,
                external_id: item.id.clone(),
                title,
                description: item.description.clone(),
                location: item.location.clone(),
                start_at,
                end_at,
                all_day,
                status: status.to_string(),
                metadata: None,
                last_updated_external: item.updated,
                etag: item.etag.clone(),
            })
            .await?;

        self.resolver.reconcile(&upserted).await
    }

    /// Handles one Microsoft Graph change notification.
    ///
    /// Graph retries aggressively on non-2xx responses, so every ignorable
    /// condition is a logged no-op. A failed event fetch is also swallowed
    /// here so a batch delivery can continue with its remaining entries.
    pub async fn handle_microsoft_notification(
        &self,
        notification: &MicrosoftNotification,
    ) -> Result<()> {
        let Some(subscription) = self
            .lookup_active_subscription(&notification.subscription_id)
            .await?
        else {
            return Ok(());
        };

        // clientState is optional; only a present-but-wrong value is a spoof.
        if let Some(state) = notification.client_state.as_deref()
            && state != subscription.subscription_id.as_str()
        {
            tracing::warn!(
                subscription_id = %subscription.subscription_id,
                "clientState mismatch on Microsoft notification, dropping"
            );
            return Ok(());
        }

        let Some(account) = self.lookup_active_account(&subscription).await? else {
            return Ok(());
        };

        self.sync_microsoft_event(&account, notification).await
    }

    async fn sync_microsoft_event(
        &self,
        account: &connected_account::Model,
        notification: &MicrosoftNotification,
    ) -> Result<()> {
        let (_, refresh_token) = self.accounts.decrypt_tokens(account)?;
        let Some(refresh_token) = refresh_token else {
            tracing::warn!(
                account_id = %account.id,
                "No refresh token on account, skipping Microsoft sync"
            );
            return Ok(());
        };

        let refreshed = self
            .providers
            .microsoft
            .acquire_token_by_refresh_token(&refresh_token)
            .await
            .context("Microsoft token refresh failed")?;
        let Some(refreshed) = refreshed else {
            tracing::warn!(
                account_id = %account.id,
                "Microsoft token response carried no access token, skipping sync"
            );
            return Ok(());
        };
        let expires_at = expiry_from_seconds(Utc::now(), refreshed.expires_in);
        let account = self
            .accounts
            .store_refreshed_access_token(account, &refreshed.access_token, expires_at)
            .await?;

        let event_id = notification
            .resource
            .rsplit('/')
            .next()
            .unwrap_or(notification.resource.as_str());

        if notification.change_type == "deleted" {
            self.external_events
                .mark_cancelled(&account.id, event_id)
                .await?;
            return self.accounts.mark_synced(&account.id, None).await;
        }

        let event = match self
            .providers
            .microsoft
            .get_event(&refreshed.access_token, event_id)
            .await
        {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(
                    account_id = %account.id,
                    event_id,
                    error = %err,
                    "Failed to fetch Microsoft event, skipping"
                );
                return Ok(());
            }
        };

        self.apply_microsoft_event(&account, &event).await?;
        self.accounts.mark_synced(&account.id, None).await
    }

    async fn apply_microsoft_event(
        &self,
        account: &connected_account::Model,
        event: &crate::providers::GraphEvent,
    ) -> Result<()> {
        let Some(title) = event.subject.clone() else {
            tracing::debug!(external_id = %event.id, "Graph event without subject, skipping");
            return Ok(());
        };
        let Some(start_at) = event.start.as_ref().and_then(|s| s.resolve()) else {
            tracing::debug!(external_id = %event.id, "Graph event without start, skipping");
            return Ok(());
        };
        let end_at = event
            .end
            .as_ref()
            .and_then(|e| e.resolve())
            .unwrap_or(start_at);

        self.external_events
            .upsert(NewExternalEvent {
                connected_account_id: account.id,
                user_id: account.user_id,
                external_id: event.id.clone(),
                title,
                description: event.body.as_ref().and_then(|b| b.content.clone()),
                location: event
                    .location
                    .as_ref()
                    .and_then(|l| l.display_name.clone()),
                start_at,
                end_at,
                all_day: event.is_all_day,
                status: map_show_as(event.show_as.as_deref()).to_string(),
                metadata: None,
                last_updated_external: event.last_modified_date_time,
                etag: event.change_key.clone(),
            })
            .await?;

        Ok(())
    }

    /// Processes a Graph delivery batch sequentially. Each failure is logged
    /// and the remaining notifications still run.
    pub async fn handle_microsoft_batch(&self, notifications: &[MicrosoftNotification]) {
        for notification in notifications {
            if let Err(err) = self.handle_microsoft_notification(notification).await {
                tracing::error!(
                    subscription_id = %notification.subscription_id,
                    resource = %notification.resource,
                    error = ?err,
                    "Microsoft notification failed"
                );
            }
        }
    }

    async fn lookup_active_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<webhook_subscription::Model>> {
        let Some(subscription) = self
            .subscriptions
            .find_by_subscription_id(subscription_id)
            .await?
        else {
            tracing::warn!(subscription_id, "Unknown subscription, dropping notification");
            return Ok(None);
        };

        if !subscription.is_active {
            tracing::warn!(subscription_id, "Inactive subscription, dropping notification");
            return Ok(None);
        }

        Ok(Some(subscription))
    }

    async fn lookup_active_account(
        &self,
        subscription: &webhook_subscription::Model,
    ) -> Result<Option<connected_account::Model>> {
        let Some(account) = self
            .accounts
            .get_by_id(&subscription.connected_account_id)
            .await?
        else {
            tracing::warn!(
                connected_account_id = %subscription.connected_account_id,
                "Subscription points at a missing account, dropping notification"
            );
            return Ok(None);
        };

        if account.status != "active" {
            tracing::warn!(
                account_id = %account.id,
                status = %account.status,
                "Account not active, dropping notification"
            );
            return Ok(None);
        }

        Ok(Some(account))
    }
}

/// Shared helper for computing a token expiry instant
pub fn expiry_from_seconds(now: DateTime<Utc>, expires_in: Option<i64>) -> Option<DateTime<Utc>> {
    expires_in.map(|secs| now + Duration::seconds(secs))
}
