use std::sync::Arc;
use tracing::{debug, warn, Span};

use super::error::AuthError;
use crate::database::models::User;
use crate::database::repository::PermissionStore;

/// Checks an already-authenticated user against a required permission code
pub struct PermissionAuthorizer {
    permissions: Arc<dyn PermissionStore>,
    span: Span,
}

impl PermissionAuthorizer {
    pub fn new(permissions: Arc<dyn PermissionStore>, span: Span) -> Self {
        Self { permissions, span }
    }

    pub async fn authorize(&self, user: &User, required: &str) -> Result<(), AuthError> {
        if !user.activated {
            debug!(parent: &self.span, user_id = user.id, "inactive account denied");
            return Err(AuthError::Forbidden(
                "your user account must be activated to access this resource".to_string(),
            ));
        }

        let granted = self.permissions.codes_for_user(user.id).await?;
        if !granted.includes(required) {
            warn!(parent: &self.span, user_id = user.id, required, "permission denied");
            return Err(AuthError::Forbidden(
                "your user account doesn't have the necessary permissions to access this resource".to_string(),
            ));
        }

        Ok(())
    }
}
