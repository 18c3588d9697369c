//! Migration to create the external_events table.
//!
//! Read-through cache of provider-native calendar events. The composite
//! unique index on (connected_account_id, external_id) is the conflict
//! target for idempotent upserts; provider deletions flip status to
//! "cancelled" instead of deleting rows.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExternalEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExternalEvents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExternalEvents::ConnectedAccountId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExternalEvents::UserId).uuid().not_null())
                    .col(ColumnDef::new(ExternalEvents::ExternalId).text().not_null())
                    .col(ColumnDef::new(ExternalEvents::Title).text().not_null())
                    .col(ColumnDef::new(ExternalEvents::Description).text().null())
                    .col(ColumnDef::new(ExternalEvents::Location).text().null())
                    .col(
                        ColumnDef::new(ExternalEvents::StartAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExternalEvents::EndAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExternalEvents::AllDay)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ExternalEvents::Status)
                            .text()
                            .not_null()
                            .default("confirmed"),
                    )
                    .col(ColumnDef::new(ExternalEvents::Metadata).json_binary().null())
                    .col(
                        ColumnDef::new(ExternalEvents::LastUpdatedExternal)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ExternalEvents::Etag).text().null())
                    .col(ColumnDef::new(ExternalEvents::OrbytEventId).uuid().null())
                    .col(
                        ColumnDef::new(ExternalEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ExternalEvents::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_external_events_connected_account_id")
                            .from(ExternalEvents::Table, ExternalEvents::ConnectedAccountId)
                            .to(ConnectedAccounts::Table, ConnectedAccounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_external_events_account_external")
                    .table(ExternalEvents::Table)
                    .col(ExternalEvents::ConnectedAccountId)
                    .col(ExternalEvents::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_external_events_orbyt_event")
                    .table(ExternalEvents::Table)
                    .col(ExternalEvents::OrbytEventId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_external_events_account_external")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_external_events_orbyt_event")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ExternalEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ExternalEvents {
    Table,
    Id,
    ConnectedAccountId,
    UserId,
    ExternalId,
    Title,
    Description,
    Location,
    StartAt,
    EndAt,
    AllDay,
    Status,
    Metadata,
    LastUpdatedExternal,
    Etag,
    OrbytEventId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ConnectedAccounts {
    Table,
    Id,
}
