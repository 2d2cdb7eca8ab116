//! Static-secret tier: promote, demote, reset.

use axum::{Json, extract::Extension, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    api::{
        error::{ApiError, ErrorBody},
        gate::{SuperAdmin, ensure_not_production},
        state::AuthState,
    },
    store::AdminTransition,
};

#[derive(ToSchema, Deserialize, Debug)]
pub struct AccountIdRequest {
    id: Uuid,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatus {
    pub id: Uuid,
    pub is_admin: bool,
}

async fn set_admin(
    state: &AuthState,
    payload: Option<Json<AccountIdRequest>>,
    is_admin: bool,
) -> Result<Json<AdminStatus>, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Missing account id"));
    };

    match state.accounts().set_admin(request.id, is_admin).await? {
        AdminTransition::Changed(account) => {
            info!(account_id = %account.id, is_admin, "Changed admin status");
            Ok(Json(AdminStatus {
                id: account.id,
                is_admin: account.is_admin,
            }))
        }
        AdminTransition::AlreadySet if is_admin => {
            Err(ApiError::bad_request("Account is already an admin"))
        }
        AdminTransition::AlreadySet => Err(ApiError::bad_request("Account is not an admin")),
        AdminTransition::UnknownAccount => Err(ApiError::bad_request("Unknown account")),
    }
}

#[utoipa::path(
    post,
    path = "/super-admin/promote-user",
    request_body = AccountIdRequest,
    responses(
        (status = 200, description = "Account promoted", body = AdminStatus),
        (status = 400, description = "Missing header or id, unknown account, or already an admin", body = ErrorBody),
        (status = 403, description = "Invalid super-admin token", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    ),
    tag = "super-admin"
)]
#[instrument(skip(state, payload))]
pub async fn promote_user(
    _caller: SuperAdmin,
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<AccountIdRequest>>,
) -> Result<Json<AdminStatus>, ApiError> {
    set_admin(&state, payload, true).await
}

#[utoipa::path(
    post,
    path = "/super-admin/demote-user",
    request_body = AccountIdRequest,
    responses(
        (status = 200, description = "Account demoted", body = AdminStatus),
        (status = 400, description = "Missing header or id, unknown account, or not an admin", body = ErrorBody),
        (status = 403, description = "Invalid super-admin token", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    ),
    tag = "super-admin"
)]
#[instrument(skip(state, payload))]
pub async fn demote_user(
    _caller: SuperAdmin,
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<AccountIdRequest>>,
) -> Result<Json<AdminStatus>, ApiError> {
    set_admin(&state, payload, false).await
}

#[utoipa::path(
    post,
    path = "/super-admin/reset-users",
    responses(
        (status = 204, description = "All accounts and refresh tokens deleted"),
        (status = 400, description = "Missing super-admin header", body = ErrorBody),
        (status = 403, description = "Invalid super-admin token or production platform", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    ),
    tag = "super-admin"
)]
#[instrument(skip(state))]
pub async fn reset_users(
    _caller: SuperAdmin,
    Extension(state): Extension<Arc<AuthState>>,
) -> Result<StatusCode, ApiError> {
    ensure_not_production(&state)?;
    let removed = state.accounts().delete_all_accounts().await?;
    warn!(removed, "Reset accounts table");
    Ok(StatusCode::NO_CONTENT)
}
