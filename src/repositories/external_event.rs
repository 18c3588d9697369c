//! External event repository
//!
//! Idempotent upserts keyed on (connected_account_id, external_id) and the
//! cancellation path used for provider-side deletions.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::external_event::{self, Entity as ExternalEvent};

/// Incoming provider event, normalized for persistence
#[derive(Debug, Clone)]
pub struct NewExternalEvent {
    pub connected_account_id: Uuid,
    pub user_id: Uuid,
    pub external_id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub all_day: bool,
    pub status: String,
    pub metadata: Option<JsonValue>,
    pub last_updated_external: Option<DateTime<Utc>>,
    pub etag: Option<String>,
}

/// Repository for external event database operations
#[derive(Debug, Clone)]
pub struct ExternalEventRepository {
    pub db: Arc<DatabaseConnection>,
}

impl ExternalEventRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find_by_natural_key(
        &self,
        connected_account_id: &Uuid,
        external_id: &str,
    ) -> Result<Option<external_event::Model>> {
        let event = ExternalEvent::find()
            .filter(external_event::Column::ConnectedAccountId.eq(*connected_account_id))
            .filter(external_event::Column::ExternalId.eq(external_id))
            .one(&*self.db)
            .await?;
        Ok(event)
    }

    /// Upserts an external event on (connected_account_id, external_id).
    ///
    /// On conflict the content columns are replaced; orbyt_event_id and
    /// created_at are preserved so an existing link to a native event
    /// survives repeated deliveries. Returns the row as persisted.
    pub async fn upsert(&self, incoming: NewExternalEvent) -> Result<external_event::Model> {
        let now = Utc::now();

        let active = external_event::ActiveModel {
            id: Set(Uuid::new_v4()),
            connected_account_id: Set(incoming.connected_account_id),
            user_id: Set(incoming.user_id),
            external_id: Set(incoming.external_id.clone()),
            title: Set(incoming.title),
            description: Set(incoming.description),
            location: Set(incoming.location),
            start_at: Set(incoming.start_at.into()),
            end_at: Set(incoming.end_at.into()),
            all_day: Set(incoming.all_day),
            status: Set(incoming.status),
            metadata: Set(incoming.metadata),
            last_updated_external: Set(incoming.last_updated_external.map(Into::into)),
            etag: Set(incoming.etag),
            orbyt_event_id: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        ExternalEvent::insert(active)
            .on_conflict(
                OnConflict::columns([
                    external_event::Column::ConnectedAccountId,
                    external_event::Column::ExternalId,
                ])
                .update_columns([
                    external_event::Column::Title,
                    external_event::Column::Description,
                    external_event::Column::Location,
                    external_event::Column::StartAt,
                    external_event::Column::EndAt,
                    external_event::Column::AllDay,
                    external_event::Column::Status,
                    external_event::Column::Metadata,
                    external_event::Column::LastUpdatedExternal,
                    external_event::Column::Etag,
                    external_event::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;

        self.find_by_natural_key(&incoming.connected_account_id, &incoming.external_id)
            .await?
            .ok_or_else(|| anyhow!("external event not persisted"))
    }

    /// Marks an external event cancelled. Missing rows are a no-op: a
    /// deletion for an event never cached requires no work.
    pub async fn mark_cancelled(
        &self,
        connected_account_id: &Uuid,
        external_id: &str,
    ) -> Result<()> {
        let Some(event) = self
            .find_by_natural_key(connected_account_id, external_id)
            .await?
        else {
            return Ok(());
        };

        let mut active: external_event::ActiveModel = event.into();
        active.status = Set("cancelled".to_string());
        active.updated_at = Set(Utc::now().into());
        active.update(&*self.db).await?;

        Ok(())
    }
}
