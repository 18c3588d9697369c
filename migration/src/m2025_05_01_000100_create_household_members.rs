//! Migration to create the household_members table.
//!
//! Membership rows link users to households; the sync engine reads them to
//! resolve the household a conflict notification should be scoped to
//! (earliest-joined membership wins).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HouseholdMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HouseholdMembers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(HouseholdMembers::HouseholdId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(HouseholdMembers::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(HouseholdMembers::Role)
                            .text()
                            .not_null()
                            .default("member"),
                    )
                    .col(
                        ColumnDef::new(HouseholdMembers::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_household_members_household_id")
                            .from(HouseholdMembers::Table, HouseholdMembers::HouseholdId)
                            .to(Households::Table, Households::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_household_members_user_joined")
                    .table(HouseholdMembers::Table)
                    .col(HouseholdMembers::UserId)
                    .col(HouseholdMembers::JoinedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_household_members_user_joined")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(HouseholdMembers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum HouseholdMembers {
    Table,
    Id,
    HouseholdId,
    UserId,
    Role,
    JoinedAt,
}

#[derive(DeriveIden)]
enum Households {
    Table,
    Id,
}
