//! Shared request state, built once at startup and handed to handlers
//! through an `Extension<Arc<AuthState>>` layer.

use secrecy::SecretString;
use std::sync::Arc;

use crate::{
    auth::{AuthConfig, AuthError, PasswordHasher, RefreshSessionManager, TokenCodec, hash_password},
    store::{AccountStore, RefreshTokenStore},
};

pub struct AuthState {
    config: AuthConfig,
    codec: TokenCodec,
    sessions: RefreshSessionManager,
    hasher: PasswordHasher,
    accounts: Arc<dyn AccountStore>,
    decoy_hash: String,
}

impl AuthState {
    /// Build the state. Hashes a decoy password once at the configured cost,
    /// which also rejects a cost bcrypt cannot use.
    ///
    /// # Errors
    /// Returns `AuthError::Hashing` if the bcrypt cost is out of range.
    pub fn new(
        config: AuthConfig,
        accounts: Arc<dyn AccountStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
    ) -> Result<Self, AuthError> {
        let codec = TokenCodec::new(config.jwt_secret(), config.issuer());
        let sessions = RefreshSessionManager::new(
            refresh_tokens,
            codec.clone(),
            config.access_token_ttl(),
            config.refresh_token_ttl(),
        );
        let hasher = PasswordHasher::new(config.bcrypt_cost(), config.hash_concurrency());
        let decoy_hash = hash_password(
            &SecretString::from("plantae-decoy-password".to_string()),
            config.bcrypt_cost(),
        )?;

        Ok(Self {
            config,
            codec,
            sessions,
            hasher,
            accounts,
            decoy_hash,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    #[must_use]
    pub fn sessions(&self) -> &RefreshSessionManager {
        &self.sessions
    }

    #[must_use]
    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    #[must_use]
    pub fn accounts(&self) -> &Arc<dyn AccountStore> {
        &self.accounts
    }

    /// Hash checked when a login names an unknown email, so both failure
    /// paths pay for one bcrypt verification.
    pub(crate) fn decoy_hash(&self) -> &str {
        &self.decoy_hash
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("config", &self.config)
            .field("sessions", &self.sessions)
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}
