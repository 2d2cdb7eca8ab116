//! Anonymous-tier endpoints: register, login, refresh, revoke.

use axum::{Json, extract::Extension, http::HeaderMap, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{AccountSummary, deserialize_secret, normalize_email, valid_email};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        gate::bearer_token,
        state::AuthState,
    },
    auth::AuthError,
    store::NewAccount,
};

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    email: String,
    #[serde(deserialize_with = "deserialize_secret")]
    #[schema(value_type = String, format = Password)]
    password: SecretString,
    #[serde(default)]
    lang_code_pref: Option<String>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct LoginRequest {
    email: String,
    #[serde(deserialize_with = "deserialize_secret")]
    #[schema(value_type = String, format = Password)]
    password: SecretString,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub account_id: Uuid,
    pub is_admin: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub account_id: Uuid,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RevokeRequest {
    account_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AccountSummary),
        (status = 400, description = "Invalid email or password", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    ),
    tag = "auth"
)]
#[instrument(skip(state, payload))]
pub async fn register(
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Missing payload"));
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email"));
    }
    let lang_code_pref = request
        .lang_code_pref
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty());

    let password_hash = state.hasher().hash(request.password).await?;
    let account = state
        .accounts()
        .create_account(NewAccount {
            email,
            password_hash,
            lang_code_pref,
        })
        .await?;

    info!(account_id = %account.id, "Registered account");

    Ok((StatusCode::CREATED, Json(AccountSummary::from(account))))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session started", body = LoginResponse),
        (status = 400, description = "Missing email or password", body = ErrorBody),
        (status = 403, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    ),
    tag = "auth"
)]
#[instrument(skip(state, payload))]
pub async fn login(
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Missing payload"));
    };

    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.expose_secret().is_empty() {
        return Err(ApiError::bad_request("Missing email or password"));
    }

    let Some(account) = state.accounts().find_account_by_email(&email).await? else {
        // Same bcrypt work and the same answer as a wrong password.
        let _ = state
            .hasher()
            .verify(request.password, state.decoy_hash().to_string())
            .await;
        debug!("Login attempt for unknown email");
        return Err(ApiError::Forbidden);
    };

    state
        .hasher()
        .verify(request.password, account.password_hash.clone())
        .await
        .map_err(|err| match err {
            AuthError::CredentialMismatch => {
                debug!(account_id = %account.id, "Login with wrong password");
                ApiError::Forbidden
            }
            other => other.into(),
        })?;

    let session = state.sessions().start_session(account.id).await?;

    info!(account_id = %account.id, "Logged in");

    Ok(Json(LoginResponse {
        access_token: session.access_token,
        access_token_expires_at: session.access_token_expires_at,
        refresh_token: session.refresh_token,
        refresh_token_expires_at: session.refresh_token_expires_at,
        account_id: account.id,
        is_admin: account.is_admin,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 400, description = "Missing bearer refresh token", body = ErrorBody),
        (status = 401, description = "Unknown, revoked or expired refresh token", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    ),
    tag = "auth"
)]
#[instrument(skip(state, headers))]
pub async fn refresh(
    Extension(state): Extension<Arc<AuthState>>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>, ApiError> {
    let refresh_token = bearer_token(&headers)?;
    let renewed = state.sessions().renew(refresh_token).await?;

    Ok(Json(RefreshResponse {
        account_id: renewed.account_id,
        access_token: renewed.access_token,
        access_token_expires_at: renewed.access_token_expires_at,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/revoke",
    request_body = RevokeRequest,
    responses(
        (status = 204, description = "Refresh token revoked"),
        (status = 400, description = "Missing bearer refresh token or account id", body = ErrorBody),
        (status = 401, description = "Unknown refresh token", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    ),
    tag = "auth"
)]
#[instrument(skip(state, headers, payload))]
pub async fn revoke(
    Extension(state): Extension<Arc<AuthState>>,
    headers: HeaderMap,
    payload: Option<Json<RevokeRequest>>,
) -> Result<StatusCode, ApiError> {
    let refresh_token = bearer_token(&headers)?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Missing accountId"));
    };

    state
        .sessions()
        .revoke(refresh_token, request.account_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
