//! Notification repository

use anyhow::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::notification;

/// Fields of a notification about to be created
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub household_id: Uuid,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub data: Option<JsonValue>,
    pub channels: Option<JsonValue>,
}

/// Repository for notification database operations
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pub db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewNotification) -> Result<notification::Model> {
        let active = notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(new.user_id),
            household_id: Set(new.household_id),
            kind: Set(new.kind),
            title: Set(new.title),
            body: Set(new.body),
            data: Set(new.data),
            channels: Set(new.channels),
            read_at: Set(None),
            created_at: Set(Utc::now().into()),
        };

        let created = active.insert(&*self.db).await?;
        Ok(created)
    }
}
