//! Connected account repository
//!
//! Encapsulates SeaORM operations for the connected_accounts table,
//! including token encryption and sync bookkeeping.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;
use uuid::Uuid;

use crate::crypto::{
    CryptoKey, decrypt_account_tokens, encrypt_account_tokens, is_encrypted_payload,
};
use crate::models::connected_account::{self, Entity as ConnectedAccount};

/// Repository for connected account database operations
#[derive(Debug, Clone)]
pub struct ConnectedAccountRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
    /// Crypto key for token encryption
    pub crypto_key: CryptoKey,
}

impl ConnectedAccountRepository {
    /// Creates a new ConnectedAccountRepository instance
    pub fn new(db: Arc<DatabaseConnection>, crypto_key: CryptoKey) -> Self {
        Self { db, crypto_key }
    }

    pub async fn get_by_id(&self, id: &Uuid) -> Result<Option<connected_account::Model>> {
        let account = ConnectedAccount::find_by_id(*id).one(&*self.db).await?;
        Ok(account)
    }

    /// Decrypts the account's tokens, warning when legacy plaintext is found
    pub fn decrypt_tokens(
        &self,
        account: &connected_account::Model,
    ) -> Result<(Option<String>, Option<String>)> {
        let has_legacy_access = account
            .access_token_ciphertext
            .as_ref()
            .is_some_and(|token| !is_encrypted_payload(token));
        let has_legacy_refresh = account
            .refresh_token_ciphertext
            .as_ref()
            .is_some_and(|token| !is_encrypted_payload(token));

        if has_legacy_access || has_legacy_refresh {
            tracing::warn!(
                account_id = %account.id,
                provider = %account.provider,
                legacy_access_token = has_legacy_access,
                legacy_refresh_token = has_legacy_refresh,
                "Legacy plaintext tokens detected, consider migrating to encrypted format"
            );
        }

        decrypt_account_tokens(&self.crypto_key, account).map_err(|e| {
            // Log decryption failures as generic auth errors without details
            tracing::error!(
                account_id = %account.id,
                provider = %account.provider,
                "Token decryption failed"
            );
            anyhow!("Token decryption failed: {}", e)
        })
    }

    /// Re-encrypts and persists a freshly refreshed access token
    pub async fn store_refreshed_access_token(
        &self,
        account: &connected_account::Model,
        access_token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<connected_account::Model> {
        let (encrypted_access_token, _) =
            encrypt_account_tokens(&self.crypto_key, account, Some(access_token), None)
                .map_err(|e| anyhow!("Token encryption failed: {}", e))?;

        let mut active: connected_account::ActiveModel = account.clone().into();
        active.access_token_ciphertext = Set(encrypted_access_token);
        active.token_expires_at = Set(expires_at.map(Into::into));
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&*self.db).await?;
        Ok(updated)
    }

    /// Records a successful sync cycle: advance the sync token when the
    /// provider returned one, stamp last_sync_at, and clear sync_error.
    pub async fn mark_synced(&self, account_id: &Uuid, sync_token: Option<&str>) -> Result<()> {
        let account = self
            .get_by_id(account_id)
            .await?
            .ok_or_else(|| anyhow!("Connected account '{}' not found", account_id))?;

        let mut active: connected_account::ActiveModel = account.into();
        if let Some(token) = sync_token {
            active.sync_token = Set(Some(token.to_string()));
        }
        active.last_sync_at = Set(Some(Utc::now().into()));
        active.sync_error = Set(None);
        active.updated_at = Set(Utc::now().into());
        active.update(&*self.db).await?;

        Ok(())
    }
}
