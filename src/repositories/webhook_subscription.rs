//! Webhook subscription repository

use anyhow::{Result, anyhow};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::webhook_subscription::{self, Entity as WebhookSubscription};

/// Repository for webhook subscription database operations
#[derive(Debug, Clone)]
pub struct WebhookSubscriptionRepository {
    pub db: Arc<DatabaseConnection>,
}

impl WebhookSubscriptionRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Looks up a subscription by its provider-assigned identifier. Returns
    /// inactive subscriptions too; callers decide whether to drop them.
    pub async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<webhook_subscription::Model>> {
        let subscription = WebhookSubscription::find()
            .filter(webhook_subscription::Column::SubscriptionId.eq(subscription_id))
            .one(&*self.db)
            .await?;
        Ok(subscription)
    }

    /// Advances the subscription-scoped incremental cursor
    pub async fn update_sync_token(&self, id: &Uuid, sync_token: &str) -> Result<()> {
        let subscription = WebhookSubscription::find_by_id(*id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow!("Webhook subscription '{}' not found", id))?;

        let mut active: webhook_subscription::ActiveModel = subscription.into();
        active.sync_token = Set(Some(sync_token.to_string()));
        active.updated_at = Set(Utc::now().into());
        active.update(&*self.db).await?;

        Ok(())
    }
}
