//! Webhook subscription entity model
//!
//! One provider push-notification registration per connected account.
//! Inactive subscriptions must never be reconciled; notifications naming
//! them are dropped silently.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Push-notification channel/subscription registered with a provider
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "webhook_subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning connected account (1:1)
    pub connected_account_id: Uuid,

    /// Provider-assigned channel/subscription identifier
    pub subscription_id: String,

    /// Google only: watched-resource identifier, used to reject spoofed
    /// callbacks carrying a different resource under the same channel
    pub resource_id: Option<String>,

    /// Subscription-scoped incremental cursor; may diverge briefly from
    /// the account-level token
    pub sync_token: Option<String>,

    pub is_active: bool,

    /// Provider-side registration expiry (renewal bookkeeping)
    pub expires_at: Option<DateTimeWithTimeZone>,

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
