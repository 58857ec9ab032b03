use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{AuthError, TokenScope};
use crate::database::models::User;
use crate::error::ApiError;

/// Authenticated user resolved from the bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user: User,
}

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }
}

/// Resolves the bearer token to a user and injects `AuthUser` into the
/// request. Every route behind this layer requires identity.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?.to_string();

    let user = state
        .authenticator
        .authenticate(&token, TokenScope::Authentication)
        .await?;

    request.extensions_mut().insert(AuthUser { user });
    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers.get(AUTHORIZATION).ok_or(AuthError::Unauthenticated)?;

    let auth_str = auth_header.to_str().map_err(|_| AuthError::MalformedCredential)?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::MalformedCredential),
    }
}
