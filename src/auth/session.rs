//! Refresh sessions: opaque long-lived tokens that mint short-lived access tokens.
//!
//! Flow Overview:
//! 1) Login calls `start_session`, which stores a fresh refresh token row.
//! 2) `renew` looks the row up and, if it is neither revoked nor expired,
//!    issues a new access token for the owning account. The row is untouched.
//! 3) `revoke` stamps the row once; later renewals fail with `RevokedToken`.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use super::{AuthError, TokenCodec, generate_refresh_token};
use crate::store::{NewRefreshToken, RefreshTokenStore, StoreError};

#[derive(Clone, Debug)]
pub struct RefreshSession {
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct RenewedAccess {
    pub account_id: Uuid,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct RefreshSessionManager {
    store: Arc<dyn RefreshTokenStore>,
    codec: TokenCodec,
    access_ttl: Duration,
    session_ttl: Duration,
}

fn store_unavailable(err: StoreError) -> AuthError {
    error!("Refresh token store failed: {err}");
    AuthError::StoreUnavailable
}

impl RefreshSessionManager {
    #[must_use]
    pub fn new(
        store: Arc<dyn RefreshTokenStore>,
        codec: TokenCodec,
        access_ttl: Duration,
        session_ttl: Duration,
    ) -> Self {
        Self {
            store,
            codec,
            access_ttl,
            session_ttl,
        }
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Create a new refresh session and its first access token.
    ///
    /// Existing sessions for the account are left alone.
    ///
    /// # Errors
    /// `InvalidTtl`, `RandomSourceUnavailable`, or `StoreUnavailable`.
    pub async fn start_session(&self, account_id: Uuid) -> Result<RefreshSession, AuthError> {
        if self.session_ttl <= Duration::zero() {
            return Err(AuthError::InvalidTtl);
        }
        let access = self.codec.issue(account_id, self.access_ttl)?;
        let refresh_token = generate_refresh_token()?;

        let created_at = Utc::now();
        let expires_at = created_at + self.session_ttl;
        self.store
            .insert_refresh_token(NewRefreshToken {
                token: refresh_token.clone(),
                account_id,
                created_at,
                expires_at,
            })
            .await
            .map_err(store_unavailable)?;

        info!(account_id = %account_id, "Started refresh session");

        Ok(RefreshSession {
            refresh_token,
            refresh_token_expires_at: expires_at,
            access_token: access.token,
            access_token_expires_at: access.expires_at,
        })
    }

    /// Mint a new access token from a refresh token.
    ///
    /// # Errors
    /// `UnknownRefreshToken`, `RevokedToken`, `ExpiredToken`, or `StoreUnavailable`.
    pub async fn renew(&self, refresh_token: &str) -> Result<RenewedAccess, AuthError> {
        let record = self
            .store
            .find_refresh_token(refresh_token)
            .await
            .map_err(store_unavailable)?
            .ok_or(AuthError::UnknownRefreshToken)?;

        // Revocation wins over expiry when both apply.
        if record.is_revoked() {
            return Err(AuthError::RevokedToken);
        }
        if record.is_expired_at(Utc::now()) {
            return Err(AuthError::ExpiredToken);
        }

        let access = self.codec.issue(record.account_id, self.access_ttl)?;

        Ok(RenewedAccess {
            account_id: record.account_id,
            access_token: access.token,
            access_token_expires_at: access.expires_at,
        })
    }

    /// Revoke a refresh token, returning the owning account id.
    ///
    /// `caller` is recorded for audit; it is not an ownership check.
    ///
    /// # Errors
    /// `UnknownRefreshToken` or `StoreUnavailable`.
    pub async fn revoke(&self, refresh_token: &str, caller: Uuid) -> Result<Uuid, AuthError> {
        let record = self
            .store
            .revoke_refresh_token(refresh_token, caller)
            .await
            .map_err(store_unavailable)?
            .ok_or(AuthError::UnknownRefreshToken)?;

        info!(
            account_id = %record.account_id,
            revoked_by = %caller,
            "Revoked refresh token"
        );

        Ok(record.account_id)
    }
}

impl std::fmt::Debug for RefreshSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshSessionManager")
            .field("codec", &self.codec)
            .field("access_ttl", &self.access_ttl)
            .field("session_ttl", &self.session_ttl)
            .finish_non_exhaustive()
    }
}
