use thiserror::Error;

/// Failures produced by the auth primitives.
///
/// Display strings are safe to log but are never sent to clients as-is; the
/// HTTP layer maps each variant to a status code and a generic phrase.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("credential is empty")]
    EmptyCredential,
    #[error("credential exceeds 72 bytes")]
    CredentialTooLong,
    #[error("credential mismatch")]
    CredentialMismatch,
    #[error("malformed token")]
    MalformedToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("invalid token signature")]
    BadSignature,
    #[error("unsupported signing algorithm")]
    UnsupportedSigningAlgorithm,
    #[error("unknown refresh token")]
    UnknownRefreshToken,
    #[error("refresh token revoked")]
    RevokedToken,
    #[error("store unavailable")]
    StoreUnavailable,
    #[error("operation forbidden on this platform")]
    ForbiddenEnvironment,
    #[error("token ttl must be positive")]
    InvalidTtl,
    #[error("secure random source unavailable")]
    RandomSourceUnavailable,
    #[error("hashing failed: {0}")]
    Hashing(String),
}

impl AuthError {
    /// True for failures that come from the caller's input rather than the server.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::StoreUnavailable
                | Self::InvalidTtl
                | Self::RandomSourceUnavailable
                | Self::Hashing(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_side_failures_are_not_client_errors() {
        assert!(!AuthError::StoreUnavailable.is_client_error());
        assert!(!AuthError::RandomSourceUnavailable.is_client_error());
        assert!(!AuthError::Hashing("boom".to_string()).is_client_error());
        assert!(AuthError::RevokedToken.is_client_error());
        assert!(AuthError::UnsupportedSigningAlgorithm.is_client_error());
    }
}
