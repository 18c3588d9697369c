//! # Data Models
//!
//! SeaORM entity models for the tables the sync engine reads and writes.

use serde::{Deserialize, Serialize};

pub mod connected_account;
pub mod event;
pub mod external_event;
pub mod household;
pub mod household_member;
pub mod notification;
pub mod webhook_subscription;

pub use connected_account::Entity as ConnectedAccount;
pub use event::Entity as Event;
pub use external_event::Entity as ExternalEvent;
pub use household::Entity as Household;
pub use household_member::Entity as HouseholdMember;
pub use notification::Entity as Notification;
pub use webhook_subscription::Entity as WebhookSubscription;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "orbyt-sync".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
