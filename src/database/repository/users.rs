use async_trait::async_trait;

use super::PgStore;
use crate::database::manager::DatabaseError;
use crate::database::models::User;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    /// Lookup by email, case-insensitive
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
}

const USER_COLUMNS: &str = "id, created_at, name, email, password_hash, activated";

#[async_trait]
impl UserStore for PgStore {
    async fn get(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        self.call(async {
            let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
            Ok::<_, DatabaseError>(user)
        })
        .await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        self.call(async {
            let user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE lower(email) = lower($1)",
                USER_COLUMNS
            ))
            .bind(email)
            .fetch_optional(self.pool())
            .await?;
            Ok::<_, DatabaseError>(user)
        })
        .await
    }
}
