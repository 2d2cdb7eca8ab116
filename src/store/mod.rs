//! Persistence seams for accounts and refresh tokens.
//!
//! Handlers and the session manager only see the two traits below. `PgStore`
//! backs them with Postgres; `MemoryStore` keeps everything in process and is
//! what the HTTP flow tests run against.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    Conflict,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub lang_code_pref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewAccount {
    /// Already normalized (trimmed, lowercased).
    pub email: String,
    pub password_hash: String,
    pub lang_code_pref: Option<String>,
}

/// Result of flipping the admin flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdminTransition {
    Changed(AccountRecord),
    AlreadySet,
    UnknownAccount,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    /// Audit only; revocation does not check ownership.
    pub revoked_by: Option<Uuid>,
}

impl RefreshTokenRecord {
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Clone, Debug)]
pub struct NewRefreshToken {
    pub token: String,
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account. `StoreError::Conflict` if the email is taken.
    async fn create_account(&self, account: NewAccount) -> Result<AccountRecord, StoreError>;

    async fn find_account_by_email(&self, email: &str)
    -> Result<Option<AccountRecord>, StoreError>;

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<AccountRecord>, StoreError>;

    async fn list_accounts(&self) -> Result<Vec<AccountRecord>, StoreError>;

    /// Set `is_admin`, refusing a transition to the current value.
    async fn set_admin(&self, id: Uuid, is_admin: bool) -> Result<AdminTransition, StoreError>;

    /// Delete every account and, with them, every refresh token.
    async fn delete_all_accounts(&self) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn insert_refresh_token(&self, token: NewRefreshToken) -> Result<(), StoreError>;

    async fn find_refresh_token(&self, token: &str)
    -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Stamp `revoked_at` with the store's own clock. A token that is already
    /// revoked keeps its original stamp. `None` when no row matches.
    async fn revoke_refresh_token(
        &self,
        token: &str,
        revoked_by: Uuid,
    ) -> Result<Option<RefreshTokenRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(expires_in: Duration) -> RefreshTokenRecord {
        let now = Utc::now();
        RefreshTokenRecord {
            token: "t".repeat(64),
            account_id: Uuid::new_v4(),
            created_at: now,
            expires_at: now + expires_in,
            revoked_at: None,
            revoked_by: None,
        }
    }

    #[test]
    fn expiry_is_strictly_after_expires_at() {
        let token = record(Duration::minutes(1));
        assert!(!token.is_expired_at(token.expires_at));
        assert!(token.is_expired_at(token.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn revoked_flag_follows_revoked_at() {
        let mut token = record(Duration::minutes(1));
        assert!(!token.is_revoked());
        token.revoked_at = Some(Utc::now());
        assert!(token.is_revoked());
    }
}
