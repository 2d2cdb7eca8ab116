use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AccountRecord, AccountStore, AdminTransition, NewAccount, NewRefreshToken, RefreshTokenRecord,
    RefreshTokenStore, StoreError,
};

/// In-process store used by tests and local runs without Postgres.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<Uuid, AccountRecord>>,
    refresh_tokens: RwLock<HashMap<String, RefreshTokenRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_account(&self, account: NewAccount) -> Result<AccountRecord, StoreError> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|existing| existing.email == account.email) {
            return Err(StoreError::Conflict);
        }

        let now = Utc::now();
        let record = AccountRecord {
            id: Uuid::new_v4(),
            email: account.email,
            password_hash: account.password_hash,
            is_admin: false,
            lang_code_pref: account.lang_code_pref,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AccountRecord>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|account| account.email == email).cloned())
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn list_accounts(&self) -> Result<Vec<AccountRecord>, StoreError> {
        let mut accounts: Vec<AccountRecord> =
            self.accounts.read().await.values().cloned().collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.email.cmp(&b.email)));
        Ok(accounts)
    }

    async fn set_admin(&self, id: Uuid, is_admin: bool) -> Result<AdminTransition, StoreError> {
        let mut accounts = self.accounts.write().await;
        let Some(account) = accounts.get_mut(&id) else {
            return Ok(AdminTransition::UnknownAccount);
        };
        if account.is_admin == is_admin {
            return Ok(AdminTransition::AlreadySet);
        }
        account.is_admin = is_admin;
        account.updated_at = Utc::now();
        Ok(AdminTransition::Changed(account.clone()))
    }

    async fn delete_all_accounts(&self) -> Result<u64, StoreError> {
        // Only place holding both locks.
        let mut accounts = self.accounts.write().await;
        let mut tokens = self.refresh_tokens.write().await;
        let removed = accounts.len() as u64;
        accounts.clear();
        tokens.clear();
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn insert_refresh_token(&self, token: NewRefreshToken) -> Result<(), StoreError> {
        let mut tokens = self.refresh_tokens.write().await;
        if tokens.contains_key(&token.token) {
            return Err(StoreError::Conflict);
        }
        tokens.insert(
            token.token.clone(),
            RefreshTokenRecord {
                token: token.token,
                account_id: token.account_id,
                created_at: token.created_at,
                expires_at: token.expires_at,
                revoked_at: None,
                revoked_by: None,
            },
        );
        Ok(())
    }

    async fn find_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        Ok(self.refresh_tokens.read().await.get(token).cloned())
    }

    async fn revoke_refresh_token(
        &self,
        token: &str,
        revoked_by: Uuid,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let mut tokens = self.refresh_tokens.write().await;
        let Some(record) = tokens.get_mut(token) else {
            return Ok(None);
        };
        if record.revoked_at.is_none() {
            record.revoked_at = Some(Utc::now());
            record.revoked_by = Some(revoked_by);
        }
        Ok(Some(record.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::Duration;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            password_hash: "$2b$04$hash".to_string(),
            lang_code_pref: None,
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() -> Result<()> {
        let store = MemoryStore::new();
        store.create_account(new_account("a@example.com")).await?;
        assert!(matches!(
            store.create_account(new_account("a@example.com")).await,
            Err(StoreError::Conflict)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn set_admin_reports_each_transition() -> Result<()> {
        let store = MemoryStore::new();
        let account = store.create_account(new_account("a@example.com")).await?;

        assert!(matches!(
            store.set_admin(account.id, true).await?,
            AdminTransition::Changed(ref updated) if updated.is_admin
        ));
        assert_eq!(
            store.set_admin(account.id, true).await?,
            AdminTransition::AlreadySet
        );
        assert_eq!(
            store.set_admin(Uuid::new_v4(), true).await?,
            AdminTransition::UnknownAccount
        );
        Ok(())
    }

    #[tokio::test]
    async fn revoke_keeps_first_stamp() -> Result<()> {
        let store = MemoryStore::new();
        let now = Utc::now();
        let owner = Uuid::new_v4();
        store
            .insert_refresh_token(NewRefreshToken {
                token: "abc".to_string(),
                account_id: owner,
                created_at: now,
                expires_at: now + Duration::days(1),
            })
            .await?;

        let first = store.revoke_refresh_token("abc", owner).await?;
        let second = store.revoke_refresh_token("abc", Uuid::new_v4()).await?;
        let (Some(first), Some(second)) = (first, second) else {
            anyhow::bail!("token should exist");
        };
        assert!(first.revoked_at.is_some());
        assert_eq!(first.revoked_at, second.revoked_at);
        assert_eq!(second.revoked_by, Some(owner));
        assert!(first.revoked_at <= Some(Utc::now()));

        assert!(store.revoke_refresh_token("missing", owner).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn delete_all_accounts_drops_tokens_too() -> Result<()> {
        let store = MemoryStore::new();
        let account = store.create_account(new_account("a@example.com")).await?;
        let now = Utc::now();
        store
            .insert_refresh_token(NewRefreshToken {
                token: "abc".to_string(),
                account_id: account.id,
                created_at: now,
                expires_at: now + Duration::days(1),
            })
            .await?;

        assert_eq!(store.delete_all_accounts().await?, 1);
        assert!(store.list_accounts().await?.is_empty());
        assert!(store.find_refresh_token("abc").await?.is_none());
        Ok(())
    }
}
