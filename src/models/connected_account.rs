//! Connected account entity model
//!
//! A connected account is one household member's link to an external
//! calendar provider (Google or Microsoft). The refresh token is the only
//! durable credential and is always stored encrypted; the access token is
//! refreshed on demand and may be stale.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Connected account linking a user to an external calendar provider
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "connected_accounts")]
pub struct Model {
    /// Unique identifier for the account (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning Orbyt user
    pub user_id: Uuid,

    /// Provider slug ("google" or "microsoft")
    pub provider: String,

    /// Account status (active|disabled); disconnect soft-disables
    pub status: String,

    /// Encrypted access token ciphertext (refreshed on demand)
    pub access_token_ciphertext: Option<Vec<u8>>,

    /// Encrypted refresh token ciphertext (the durable credential)
    pub refresh_token_ciphertext: Option<Vec<u8>>,

    /// Access token expiry reported by the provider
    pub token_expires_at: Option<DateTimeWithTimeZone>,

    /// Account-level incremental-sync cursor
    pub sync_token: Option<String>,

    /// Timestamp of the last successful sync cycle
    pub last_sync_at: Option<DateTimeWithTimeZone>,

    /// Diagnostic string from the last failed sync, cleared on success
    pub sync_error: Option<String>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::webhook_subscription::Entity")]
    WebhookSubscription,
    #[sea_orm(has_many = "super::external_event::Entity")]
    ExternalEvent,
}

impl Related<super::webhook_subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WebhookSubscription.def()
    }
}

impl Related<super::external_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExternalEvent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
