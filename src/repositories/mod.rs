//! # Repository Layer
//!
//! Repository implementations that encapsulate SeaORM operations for the
//! sync engine's entities, providing a narrow data-access API.

pub mod connected_account;
pub mod event;
pub mod external_event;
pub mod household_member;
pub mod notification;
pub mod webhook_subscription;

pub use connected_account::ConnectedAccountRepository;
pub use event::EventRepository;
pub use external_event::{ExternalEventRepository, NewExternalEvent};
pub use household_member::HouseholdMemberRepository;
pub use notification::{NewNotification, NotificationRepository};
pub use webhook_subscription::WebhookSubscriptionRepository;
