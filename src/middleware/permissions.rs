use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::auth::AuthUser;
use crate::auth::PermissionAuthorizer;
use crate::error::ApiError;

/// One required permission code bound to the authorizer. Layered inside
/// `require_auth`, so identity is always checked first.
#[derive(Clone)]
pub struct PermissionGate {
    authorizer: Arc<PermissionAuthorizer>,
    code: Arc<str>,
}

impl PermissionGate {
    pub fn new(authorizer: Arc<PermissionAuthorizer>, code: &str) -> Self {
        Self { authorizer, code: Arc::from(code) }
    }
}

pub async fn require_permission(
    State(gate): State<PermissionGate>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or(ApiError::Unauthenticated)?;

    gate.authorizer.authorize(&auth.user, &gate.code).await?;
    Ok(next.run(request).await)
}
