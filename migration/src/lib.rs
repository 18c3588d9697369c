//! Database migrations for the Orbyt sync service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_05_01_000001_create_households;
mod m2025_05_01_000100_create_household_members;
mod m2025_05_01_000200_create_connected_accounts;
mod m2025_05_01_000300_create_events;
mod m2025_05_01_000400_create_external_events;
mod m2025_05_01_000500_create_webhook_subscriptions;
mod m2025_05_01_000600_create_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_05_01_000001_create_households::Migration),
            Box::new(m2025_05_01_000100_create_household_members::Migration),
            Box::new(m2025_05_01_000200_create_connected_accounts::Migration),
            Box::new(m2025_05_01_000300_create_events::Migration),
            Box::new(m2025_05_01_000400_create_external_events::Migration),
            Box::new(m2025_05_01_000500_create_webhook_subscriptions::Migration),
            Box::new(m2025_05_01_000600_create_notifications::Migration),
        ]
    }
}
