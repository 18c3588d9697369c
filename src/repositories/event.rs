//! Native event repository
//!
//! The sync engine only reads native events and overwrites their content
//! fields when conflict resolution decides the external copy wins.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::event::{self, Entity as Event};

/// Content fields copied from the external event when it wins a conflict
#[derive(Debug, Clone)]
pub struct ExternalOverwrite {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub all_day: bool,
}

/// Repository for native event database operations
#[derive(Debug, Clone)]
pub struct EventRepository {
    pub db: Arc<DatabaseConnection>,
}

impl EventRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, id: &Uuid) -> Result<Option<event::Model>> {
        let event = Event::find_by_id(*id).one(&*self.db).await?;
        Ok(event)
    }

    /// Overwrites the native event from its external counterpart and stamps
    /// last_synced_at.
    pub async fn overwrite_from_external(
        &self,
        id: &Uuid,
        fields: ExternalOverwrite,
    ) -> Result<event::Model> {
        let event = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| anyhow!("Event '{}' not found", id))?;

        let now = Utc::now();
        let mut active: event::ActiveModel = event.into();
        active.title = Set(fields.title);
        active.description = Set(fields.description);
        active.location = Set(fields.location);
        active.start_at = Set(fields.start_at.into());
        active.end_at = Set(fields.end_at.into());
        active.all_day = Set(fields.all_day);
        active.last_synced_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());

        let updated = active.update(&*self.db).await?;
        Ok(updated)
    }
}
