//! # Sync Engine
//!
//! Reconciliation of provider push notifications against the local event
//! cache, plus conflict detection against natively created events.

pub mod engine;
pub mod reconcile;

pub use engine::{MicrosoftNotification, SyncEngine};
pub use reconcile::ConflictResolver;
