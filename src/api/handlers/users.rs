use axum::{Json, extract::Extension};
use std::sync::Arc;
use tracing::debug;

use super::AccountSummary;
use crate::api::{
    error::{ApiError, ErrorBody},
    gate::{AdminConfirmed, Authenticated},
    state::AuthState,
};

#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "The caller's account", body = AccountSummary),
        (status = 400, description = "Missing bearer access token", body = ErrorBody),
        (status = 401, description = "Invalid access token", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    ),
    tag = "users"
)]
pub async fn me(
    caller: Authenticated,
    Extension(state): Extension<Arc<AuthState>>,
) -> Result<Json<AccountSummary>, ApiError> {
    let Some(account) = state.accounts().find_account_by_id(caller.account_id).await? else {
        debug!(account_id = %caller.account_id, "Token subject no longer exists");
        return Err(ApiError::Unauthorized);
    };
    Ok(Json(account.into()))
}

#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "All accounts", body = [AccountSummary]),
        (status = 400, description = "Missing bearer access token", body = ErrorBody),
        (status = 401, description = "Caller is not an admin", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    ),
    tag = "admin"
)]
pub async fn list_users(
    _admin: AdminConfirmed,
    Extension(state): Extension<Arc<AuthState>>,
) -> Result<Json<Vec<AccountSummary>>, ApiError> {
    let accounts = state.accounts().list_accounts().await?;
    Ok(Json(accounts.into_iter().map(AccountSummary::from).collect()))
}
