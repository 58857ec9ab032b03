use chrono::Duration;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn, Span};

use super::error::ServiceError;
use crate::auth::{Authenticator, IssuedToken, TokenScope};
use crate::database::repository::UserStore;

const DECOY_PASSWORD: &str = "decoy password for unknown accounts";

/// Login and logout on top of the token authenticator
pub struct AccountService {
    users: Arc<dyn UserStore>,
    authenticator: Arc<Authenticator>,
    token_ttl: Duration,
    password_cost: u32,
    /// Hash verified against when the email is unknown, so both failure
    /// paths pay one bcrypt verify at the same cost
    decoy: Arc<OnceCell<String>>,
    span: Span,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        authenticator: Arc<Authenticator>,
        token_ttl: Duration,
        password_cost: u32,
        span: Span,
    ) -> Self {
        Self { users, authenticator, token_ttl, password_cost, decoy: Arc::new(OnceCell::new()), span }
    }

    /// Issues an authentication token when the password matches. Unknown
    /// email and wrong password are reported the same way.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, ServiceError> {
        let mut errors = HashMap::new();
        if email.trim().is_empty() || !email.contains('@') {
            errors.insert("email".to_string(), "must be a valid email address".to_string());
        }
        if password.is_empty() {
            errors.insert("password".to_string(), "must be provided".to_string());
        }
        if !errors.is_empty() {
            return Err(ServiceError::validation(errors));
        }

        let user = self.users.get_by_email(email.trim()).await?;
        let matches = self.verify_password(password, user.as_ref().map(|u| u.password_hash.clone())).await?;

        let user = match user {
            Some(user) if matches => user,
            Some(user) => {
                warn!(parent: &self.span, user_id = user.id, "login with wrong password");
                return Err(ServiceError::InvalidCredentials);
            }
            None => {
                warn!(parent: &self.span, "login for unknown email");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let issued = self
            .authenticator
            .issue(user.id, TokenScope::Authentication, self.token_ttl)
            .await?;
        info!(parent: &self.span, user_id = user.id, "user logged in");
        Ok(issued)
    }

    /// Runs bcrypt against the stored hash, or against the decoy when there
    /// is none. A decoy check never matches.
    async fn verify_password(&self, password: &str, stored: Option<String>) -> Result<bool, ServiceError> {
        let password = password.to_string();
        let decoy = self.decoy.clone();
        let cost = self.password_cost;

        let outcome = tokio::task::spawn_blocking(move || match stored {
            Some(hash) => bcrypt::verify(password, &hash),
            None => {
                let hash = decoy.get_or_try_init(|| bcrypt::hash(DECOY_PASSWORD, cost))?;
                bcrypt::verify(password, hash).map(|_| false)
            }
        })
        .await
        .map_err(|e| ServiceError::Internal(format!("password check aborted: {}", e)))?;

        outcome.map_err(|e| ServiceError::Internal(format!("password hash unusable: {}", e)))
    }

    /// Removes every authentication token of the user
    pub async fn logout(&self, user_id: i64) -> Result<u64, ServiceError> {
        Ok(self.authenticator.revoke_all(user_id, TokenScope::Authentication).await?)
    }
}
