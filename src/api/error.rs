//! HTTP error mapping.
//!
//! Client errors (400/409) may carry a validation message. 401 and 403 only
//! ever carry their status phrase so callers cannot tell which check failed.
//! 500 bodies are generic; the detail goes to the log.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::{auth::AuthError, store::StoreError};

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("{0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(message) | Self::Conflict(message) => message.clone(),
            _ => self
                .status()
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmptyCredential => Self::bad_request("Password must not be empty"),
            AuthError::CredentialTooLong => {
                Self::bad_request("Password must be at most 72 bytes")
            }
            AuthError::CredentialMismatch | AuthError::ForbiddenEnvironment => Self::Forbidden,
            AuthError::MalformedToken
            | AuthError::ExpiredToken
            | AuthError::BadSignature
            | AuthError::UnsupportedSigningAlgorithm
            | AuthError::UnknownRefreshToken
            | AuthError::RevokedToken => {
                debug!("Rejected token: {err}");
                Self::Unauthorized
            }
            AuthError::StoreUnavailable
            | AuthError::InvalidTtl
            | AuthError::RandomSourceUnavailable
            | AuthError::Hashing(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::Conflict("Account already exists".to_string()),
            StoreError::Database(err) => Self::Internal(format!("store failure: {err}")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::Internal(detail) = &self {
            error!("Request failed: {detail}");
        } else {
            debug!("Request rejected with {status}: {self}");
        }
        let body = ErrorBody {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = ApiError::Internal("connection refused at 10.0.0.3".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal Server Error");
    }

    #[test]
    fn token_failures_collapse_to_unauthorized() {
        for err in [
            AuthError::MalformedToken,
            AuthError::ExpiredToken,
            AuthError::BadSignature,
            AuthError::UnsupportedSigningAlgorithm,
            AuthError::UnknownRefreshToken,
            AuthError::RevokedToken,
        ] {
            let api: ApiError = err.into();
            assert_eq!(api.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(api.public_message(), "Unauthorized");
        }
    }

    #[test]
    fn credential_mismatch_is_forbidden() {
        let api: ApiError = AuthError::CredentialMismatch.into();
        assert_eq!(api.status(), StatusCode::FORBIDDEN);
        assert_eq!(api.public_message(), "Forbidden");
    }

    #[test]
    fn validation_errors_keep_their_message() {
        let api: ApiError = AuthError::CredentialTooLong.into();
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert!(api.public_message().contains("72"));

        let api: ApiError = StoreError::Conflict.into();
        assert_eq!(api.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn store_failure_is_internal() {
        let api: ApiError = StoreError::Database(sqlx::Error::PoolTimedOut).into();
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.public_message(), "Internal Server Error");
    }
}
