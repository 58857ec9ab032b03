use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn, Span};

use super::error::AuthError;
use super::token::{IssuedToken, TokenCodec, TokenScope};
use super::Clock;
use crate::database::models::User;
use crate::database::repository::{TokenStore, UserStore};

/// Resolves bearer tokens to users and issues new tokens.
pub struct Authenticator {
    tokens: Arc<dyn TokenStore>,
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
    span: Span,
}

impl Authenticator {
    pub fn new(tokens: Arc<dyn TokenStore>, users: Arc<dyn UserStore>, clock: Arc<dyn Clock>, span: Span) -> Self {
        Self { tokens, users, clock, span }
    }

    /// Returns the owner of `presented` if it is a live token of `scope`.
    /// Read-only: expired rows are left for a separate cleanup.
    pub async fn authenticate(&self, presented: &str, scope: TokenScope) -> Result<User, AuthError> {
        if !TokenCodec::is_well_formed(presented) {
            debug!(parent: &self.span, "rejected malformed credential");
            return Err(AuthError::MalformedCredential);
        }

        let hash = TokenCodec::hash(presented);
        let record = self
            .tokens
            .find_by_hash(&hash)
            .await?
            .ok_or(AuthError::CredentialNotFound)?;

        if record.scope != scope {
            warn!(
                parent: &self.span,
                user_id = record.user_id,
                token_scope = %record.scope,
                required_scope = %scope,
                "token presented for the wrong scope"
            );
            return Err(AuthError::CredentialNotFound);
        }

        if record.is_expired_at(self.clock.now()) {
            debug!(parent: &self.span, user_id = record.user_id, expiry = %record.expiry, "rejected expired credential");
            return Err(AuthError::CredentialExpired);
        }

        self.users
            .get(record.user_id)
            .await?
            .ok_or(AuthError::CredentialNotFound)
    }

    /// Creates and stores a token; the returned plaintext is the only copy.
    pub async fn issue(&self, user_id: i64, scope: TokenScope, ttl: Duration) -> Result<IssuedToken, AuthError> {
        let issued = TokenCodec::issue(user_id, scope, self.clock.now() + ttl);
        self.tokens.insert(&issued.record).await?;
        info!(parent: &self.span, user_id, scope = %scope, expiry = %issued.record.expiry, "token issued");
        Ok(issued)
    }

    pub async fn revoke_all(&self, user_id: i64, scope: TokenScope) -> Result<u64, AuthError> {
        let removed = self.tokens.delete_all_for_user(scope, user_id).await?;
        info!(parent: &self.span, user_id, scope = %scope, removed, "tokens revoked");
        Ok(removed)
    }
}
