//! Authorization gates.
//!
//! Flow Overview:
//! - `Anonymous -> SuperAdmin`: `Authorization: SuperAdminToken <secret>`,
//!   compared in constant time against the configured secret.
//! - `Anonymous -> Authenticated`: `Authorization: Bearer <access token>`.
//! - `Authenticated -> AdminConfirmed`: the account still exists and has
//!   `is_admin` set.
//!
//! Each gate is a plain function over the request headers and also an axum
//! extractor, so a handler declares its tier by taking `SuperAdmin`,
//! `Authenticated` or `AdminConfirmed` as an argument.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{error::ApiError, state::AuthState};
use crate::auth::{AuthError, validate_super_admin};

const BEARER_PREFIX: &str = "Bearer ";
const SUPER_ADMIN_PREFIX: &str = "SuperAdminToken ";

/// Caller presented the static super-admin secret.
#[derive(Clone, Copy, Debug)]
pub struct SuperAdmin;

/// Caller presented a valid access token.
#[derive(Clone, Copy, Debug)]
pub struct Authenticated {
    pub account_id: Uuid,
}

/// Authenticated caller whose account is currently an admin.
#[derive(Clone, Copy, Debug)]
pub struct AdminConfirmed {
    pub account_id: Uuid,
}

fn authorization_value<'a>(headers: &'a HeaderMap, prefix: &str) -> Result<&'a str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::bad_request("Missing Authorization header"))?
        .to_str()
        .map_err(|_| ApiError::bad_request("Malformed Authorization header"))?;

    let Some(credential) = value.strip_prefix(prefix) else {
        debug!("Authorization header does not carry the expected scheme");
        return Err(ApiError::bad_request("Malformed Authorization header"));
    };
    let credential = credential.trim();
    if credential.is_empty() {
        return Err(ApiError::bad_request("Malformed Authorization header"));
    }
    Ok(credential)
}

/// Extract the value of `Authorization: Bearer <token>`.
///
/// # Errors
/// 400 when the header is missing, not ASCII, or uses another scheme.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    authorization_value(headers, BEARER_PREFIX)
}

/// # Errors
/// 400 for a missing or malformed header, 403 for a wrong secret.
pub fn require_super_admin(headers: &HeaderMap, state: &AuthState) -> Result<SuperAdmin, ApiError> {
    let supplied = authorization_value(headers, SUPER_ADMIN_PREFIX)?;
    if validate_super_admin(state.config().super_admin_token(), supplied) {
        Ok(SuperAdmin)
    } else {
        warn!("Rejected super-admin request with an invalid secret");
        Err(ApiError::Forbidden)
    }
}

/// # Errors
/// 400 for a missing or malformed header, 401 for any token failure.
pub fn require_authenticated(
    headers: &HeaderMap,
    state: &AuthState,
) -> Result<Authenticated, ApiError> {
    let token = bearer_token(headers)?;
    let account_id = state.codec().verify(token)?;
    Ok(Authenticated { account_id })
}

/// # Errors
/// Everything `require_authenticated` returns, plus 401 when the account is
/// gone or not an admin and 500 when the account store fails.
pub async fn require_admin(
    headers: &HeaderMap,
    state: &AuthState,
) -> Result<AdminConfirmed, ApiError> {
    let Authenticated { account_id } = require_authenticated(headers, state)?;
    match state.accounts().find_account_by_id(account_id).await? {
        Some(account) if account.is_admin => Ok(AdminConfirmed { account_id }),
        Some(_) => {
            debug!(account_id = %account_id, "Account is not an admin");
            Err(ApiError::Unauthorized)
        }
        None => {
            debug!(account_id = %account_id, "Token subject no longer exists");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Destructive super-admin operations never run against production.
///
/// # Errors
/// 403 when the configured platform is `production`.
pub fn ensure_not_production(state: &AuthState) -> Result<(), ApiError> {
    if state.config().is_production() {
        warn!("Refused destructive super-admin operation on production");
        return Err(AuthError::ForbiddenEnvironment.into());
    }
    Ok(())
}

fn state_from_parts(parts: &Parts) -> Result<Arc<AuthState>, ApiError> {
    parts
        .extensions
        .get::<Arc<AuthState>>()
        .cloned()
        .ok_or_else(|| ApiError::Internal("auth state extension missing".to_string()))
}

#[async_trait]
impl<S> FromRequestParts<S> for SuperAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let state = state_from_parts(parts)?;
        require_super_admin(&parts.headers, &state)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let state = state_from_parts(parts)?;
        require_authenticated(&parts.headers, &state)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminConfirmed
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let state = state_from_parts(parts)?;
        require_admin(&parts.headers, &state).await
    }
}
