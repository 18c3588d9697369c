//! Conflict detection between external and native events
//!
//! Runs after a Google upsert, only for external events linked to a native
//! Orbyt event and carrying a provider modification timestamp. Resolution
//! is last-write-wins by wall clock; no clock-skew correction and no
//! field-level merge.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::external_event;
use crate::repositories::{
    EventRepository, HouseholdMemberRepository, NewNotification, NotificationRepository,
    event::ExternalOverwrite,
};

/// Which side a conflict resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    ExternalWins,
    NativeWins,
}

/// Detects both-sides-changed conflicts and applies last-write-wins
#[derive(Debug, Clone)]
pub struct ConflictResolver {
    events: EventRepository,
    notifications: NotificationRepository,
    households: HouseholdMemberRepository,
}

impl ConflictResolver {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            events: EventRepository::new(db.clone()),
            notifications: NotificationRepository::new(db.clone()),
            households: HouseholdMemberRepository::new(db),
        }
    }

    /// Reconciles one freshly upserted external event against its linked
    /// native event, if any.
    pub async fn reconcile(&self, external: &external_event::Model) -> Result<()> {
        let Some(orbyt_event_id) = external.orbyt_event_id else {
            return Ok(());
        };
        let Some(external_updated) = external.last_updated_external else {
            return Ok(());
        };

        let Some(native) = self.events.get_by_id(&orbyt_event_id).await? else {
            tracing::warn!(
                external_event_id = %external.id,
                orbyt_event_id = %orbyt_event_id,
                "Linked native event missing, skipping conflict check"
            );
            return Ok(());
        };

        // A linked event that was never synced uses the epoch as its
        // baseline, so any native edit counts as a change.
        let last_synced = native
            .last_synced_at
            .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH.into());
        let native_changed = native.updated_at > last_synced;
        let external_changed = external_updated > last_synced;

        if native_changed && external_changed {
            let resolution = if external_updated > native.updated_at {
                self.events
                    .overwrite_from_external(&orbyt_event_id, overwrite_fields(external))
                    .await?;
                Resolution::ExternalWins
            } else {
                Resolution::NativeWins
            };

            tracing::info!(
                orbyt_event_id = %orbyt_event_id,
                external_event_id = %external.id,
                ?resolution,
                "Calendar conflict resolved by last-write-wins"
            );

            self.notify_conflict(external, &orbyt_event_id, resolution)
                .await?;
        } else if external_changed {
            self.events
                .overwrite_from_external(&orbyt_event_id, overwrite_fields(external))
                .await?;
        }

        Ok(())
    }

    async fn notify_conflict(
        &self,
        external: &external_event::Model,
        orbyt_event_id: &Uuid,
        resolution: Resolution,
    ) -> Result<()> {
        let Some(household_id) = self
            .households
            .find_primary_household(&external.user_id)
            .await?
        else {
            tracing::warn!(
                user_id = %external.user_id,
                "No household membership found, dropping conflict notification"
            );
            return Ok(());
        };

        let resolved_to = match resolution {
            Resolution::ExternalWins => "external",
            Resolution::NativeWins => "native",
        };

        self.notifications
            .create(NewNotification {
                user_id: external.user_id,
                household_id,
                kind: "sync_conflict".to_string(),
                title: "Calendar sync conflict".to_string(),
                body: format!(
                    "\"{}\" was edited in Orbyt and in your external calendar. The most recent change was kept.",
                    external.title
                ),
                data: Some(json!({
                    "event_id": orbyt_event_id,
                    "external_event_id": external.id,
                    "resolved_to": resolved_to,
                    "link": "/calendar",
                })),
                channels: Some(json!(["in_app"])),
            })
            .await?;

        Ok(())
    }
}

fn overwrite_fields(external: &external_event::Model) -> ExternalOverwrite {
    ExternalOverwrite {
        title: external.title.clone(),
        description: external.description.clone(),
        location: external.location.clone(),
        start_at: to_utc(external.start_at),
        end_at: to_utc(external.end_at),
        all_day: external.all_day,
    }
}

fn to_utc(value: sea_orm::prelude::DateTimeWithTimeZone) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}
