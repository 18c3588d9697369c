//! External event entity model
//!
//! Read-through cache of one provider-native calendar event. The
//! (connected_account_id, external_id) pair is unique and serves as the
//! upsert conflict target. Provider deletions flip status to "cancelled"
//! rather than deleting the row.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Cached copy of a provider-native calendar event
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "external_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub connected_account_id: Uuid,

    pub user_id: Uuid,

    /// Provider's event id, unique per connected account
    pub external_id: String,

    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_at: DateTimeWithTimeZone,
    pub end_at: DateTimeWithTimeZone,
    pub all_day: bool,

    /// confirmed | tentative | cancelled
    pub status: String,

    /// Provider-specific free-form payload
    #[sea_orm(column_type = "JsonBinary")]
    pub metadata: Option<JsonValue>,

    /// Provider's own last-modified timestamp
    pub last_updated_external: Option<DateTimeWithTimeZone>,

    /// Provider optimistic-concurrency token (etag / changeKey)
    pub etag: Option<String>,

    /// Back-reference to a native Orbyt event, when linked
    pub orbyt_event_id: Option<Uuid>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::connected_account::Entity",
        from = "Column::ConnectedAccountId",
        to = "super::connected_account::Column::Id"
    )]
    ConnectedAccount,
}

impl Related<super::connected_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConnectedAccount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
