//! Migration to create the connected_accounts table.
//!
//! A connected account is one household member's link to an external
//! calendar provider, carrying encrypted OAuth tokens and the provider's
//! incremental-sync cursor.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConnectedAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConnectedAccounts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ConnectedAccounts::UserId).uuid().not_null())
                    .col(ColumnDef::new(ConnectedAccounts::Provider).text().not_null())
                    .col(
                        ColumnDef::new(ConnectedAccounts::Status)
                            .text()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(ConnectedAccounts::AccessTokenCiphertext)
                            .binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ConnectedAccounts::RefreshTokenCiphertext)
                            .binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ConnectedAccounts::TokenExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ConnectedAccounts::SyncToken).text().null())
                    .col(
                        ColumnDef::new(ConnectedAccounts::LastSyncAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ConnectedAccounts::SyncError).text().null())
                    .col(
                        ColumnDef::new(ConnectedAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ConnectedAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_connected_accounts_user_provider")
                    .table(ConnectedAccounts::Table)
                    .col(ConnectedAccounts::UserId)
                    .col(ConnectedAccounts::Provider)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_connected_accounts_user_provider")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ConnectedAccounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ConnectedAccounts {
    Table,
    Id,
    UserId,
    Provider,
    Status,
    AccessTokenCiphertext,
    RefreshTokenCiphertext,
    TokenExpiresAt,
    SyncToken,
    LastSyncAt,
    SyncError,
    CreatedAt,
    UpdatedAt,
}
