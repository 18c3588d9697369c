//! Household membership repository

use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::household_member::{self, Entity as HouseholdMember};

/// Repository for household membership lookups
#[derive(Debug, Clone)]
pub struct HouseholdMemberRepository {
    pub db: Arc<DatabaseConnection>,
}

impl HouseholdMemberRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Resolves the household a user's notifications belong to: the
    /// earliest-joined membership.
    pub async fn find_primary_household(&self, user_id: &Uuid) -> Result<Option<Uuid>> {
        let membership = HouseholdMember::find()
            .filter(household_member::Column::UserId.eq(*user_id))
            .order_by_asc(household_member::Column::JoinedAt)
            .one(&*self.db)
            .await?;
        Ok(membership.map(|m| m.household_id))
    }
}
