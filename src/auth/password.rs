//! Password hashing with bcrypt.
//!
//! Plaintext passwords only ever exist inside a [`SecretString`], which is
//! zeroized when dropped. The async [`PasswordHasher`] moves the secret into a
//! blocking task so the bcrypt work never runs on the async executor, and a
//! semaphore caps how many hashes run at once.

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error};

use super::AuthError;

/// bcrypt only reads the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Hash a plaintext password into a self-describing bcrypt string.
///
/// # Errors
/// Returns `EmptyCredential` for an empty password, `CredentialTooLong` above
/// 72 bytes, and `Hashing` if bcrypt itself fails.
pub fn hash_password(password: &SecretString, cost: u32) -> Result<String, AuthError> {
    let plaintext = password.expose_secret();
    if plaintext.is_empty() {
        return Err(AuthError::EmptyCredential);
    }
    if plaintext.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::CredentialTooLong);
    }

    bcrypt::hash(plaintext.as_bytes(), cost).map_err(|err| {
        error!("Failed to hash password: {err}");
        AuthError::Hashing(err.to_string())
    })
}

/// Check a plaintext password against a stored bcrypt hash.
///
/// # Errors
/// Returns `CredentialMismatch` on any disagreement, including a corrupt hash.
pub fn verify_password(password: &SecretString, hash: &str) -> Result<(), AuthError> {
    let plaintext = password.expose_secret();
    // Longer inputs would be silently truncated and could match a prefix.
    if plaintext.is_empty() || plaintext.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::CredentialMismatch);
    }

    match bcrypt::verify(plaintext.as_bytes(), hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::CredentialMismatch),
        Err(err) => {
            debug!("Failed to verify password hash: {err}");
            Err(AuthError::CredentialMismatch)
        }
    }
}

/// Runs bcrypt on the blocking pool with bounded concurrency.
#[derive(Clone, Debug)]
pub struct PasswordHasher {
    cost: u32,
    permits: Arc<Semaphore>,
}

impl PasswordHasher {
    #[must_use]
    pub fn new(cost: u32, concurrency: usize) -> Self {
        Self {
            cost,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Wait for a hashing slot. The permit travels into the blocking task, so
    /// the slot stays taken until bcrypt returns even if the caller is dropped.
    async fn permit(&self) -> Result<OwnedSemaphorePermit, AuthError> {
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|err| AuthError::Hashing(err.to_string()))
    }

    /// Hash a password, consuming the secret.
    ///
    /// # Errors
    /// Same as [`hash_password`]; `Hashing` if the blocking task fails.
    pub async fn hash(&self, password: SecretString) -> Result<String, AuthError> {
        let permit = self.permit().await?;
        let cost = self.cost;
        tokio::task::spawn_blocking(move || {
            let hashed = hash_password(&password, cost);
            drop(permit);
            hashed
        })
        .await
        .map_err(|err| AuthError::Hashing(err.to_string()))?
    }

    /// Verify a password against a stored hash, consuming the secret.
    ///
    /// # Errors
    /// Same as [`verify_password`]; `Hashing` if the blocking task fails.
    pub async fn verify(&self, password: SecretString, hash: String) -> Result<(), AuthError> {
        let permit = self.permit().await?;
        tokio::task::spawn_blocking(move || {
            let verified = verify_password(&password, &hash);
            drop(permit);
            verified
        })
        .await
        .map_err(|err| AuthError::Hashing(err.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    // Lowest cost bcrypt accepts; keeps the suite fast.
    const TEST_COST: u32 = 4;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[test]
    fn hash_then_verify_accepts_same_password() -> Result<()> {
        for len in [1usize, 7, 32, 71, 72] {
            let password = "p".repeat(len);
            let hash = hash_password(&secret(&password), TEST_COST)?;
            assert!(hash.starts_with("$2"));
            assert!(verify_password(&secret(&password), &hash).is_ok());
        }
        Ok(())
    }

    #[test]
    fn verify_rejects_different_password() -> Result<()> {
        let hash = hash_password(&secret("hunter2"), TEST_COST)?;
        assert!(matches!(
            verify_password(&secret("hunter3"), &hash),
            Err(AuthError::CredentialMismatch)
        ));
        Ok(())
    }

    #[test]
    fn hash_rejects_empty_password() {
        assert!(matches!(
            hash_password(&secret(""), TEST_COST),
            Err(AuthError::EmptyCredential)
        ));
    }

    #[test]
    fn hash_rejects_73_bytes() {
        let password = "a".repeat(MAX_PASSWORD_BYTES + 1);
        assert!(matches!(
            hash_password(&secret(&password), TEST_COST),
            Err(AuthError::CredentialTooLong)
        ));
    }

    #[test]
    fn verify_rejects_overlong_input_sharing_a_prefix() -> Result<()> {
        let base = "b".repeat(MAX_PASSWORD_BYTES);
        let hash = hash_password(&secret(&base), TEST_COST)?;
        let longer = format!("{base}extra");
        assert!(matches!(
            verify_password(&secret(&longer), &hash),
            Err(AuthError::CredentialMismatch)
        ));
        Ok(())
    }

    #[test]
    fn corrupt_hash_is_reported_as_mismatch() {
        assert!(matches!(
            verify_password(&secret("hunter2"), "not-a-bcrypt-hash"),
            Err(AuthError::CredentialMismatch)
        ));
    }

    #[tokio::test]
    async fn async_hasher_round_trips() -> Result<()> {
        let hasher = PasswordHasher::new(TEST_COST, 2);
        let hash = hasher.hash(secret("hunter2")).await?;
        hasher.verify(secret("hunter2"), hash.clone()).await?;
        assert!(hasher.verify(secret("hunter22"), hash).await.is_err());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn dropped_caller_keeps_hashing_slot_until_bcrypt_returns() -> Result<()> {
        // Slow enough that the abort lands while bcrypt is still running.
        let hasher = PasswordHasher::new(12, 1);
        let permits = Arc::clone(&hasher.permits);

        let caller = {
            let hasher = hasher.clone();
            tokio::spawn(async move { hasher.hash(secret("hunter2")).await })
        };
        while permits.available_permits() != 0 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        caller.abort();
        assert!(caller.await.is_err_and(|err| err.is_cancelled()));

        assert_eq!(permits.available_permits(), 0);

        tokio::time::timeout(std::time::Duration::from_secs(30), async {
            while permits.available_permits() == 0 {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        })
        .await?;
        assert_eq!(permits.available_permits(), 1);
        Ok(())
    }
}
