// /api/v1/users/*

use axum::{extract::State, Extension};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::TokenSecret;
use crate::database::models::Purchase;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginOutput {
    pub token: TokenSecret,
    pub expiry: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LogoutOutput {
    pub message: &'static str,
    pub revoked: u64,
}

/// POST /api/v1/users/login - exchange email and password for a bearer token
pub async fn login_post(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginInput>,
) -> ApiResult<LoginOutput> {
    let issued = state.accounts.login(&input.email, &input.password).await?;
    Ok(ApiResponse::created(LoginOutput {
        token: issued.plaintext,
        expiry: issued.record.expiry,
    }))
}

/// DELETE /api/v1/users/tokens - revoke every session of the caller
pub async fn tokens_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<LogoutOutput> {
    let revoked = state.accounts.logout(auth.id()).await?;
    Ok(ApiResponse::success(LogoutOutput { message: "logged out", revoked }))
}

/// GET /api/v1/users/purchases - the caller's purchases, newest first
pub async fn purchases_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<Purchase>> {
    let purchases = state.purchases.list_for_user(auth.id()).await?;
    Ok(ApiResponse::success(purchases))
}
