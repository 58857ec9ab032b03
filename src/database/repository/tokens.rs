use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::PgStore;
use crate::auth::token::{TokenRecord, TokenScope};
use crate::database::manager::DatabaseError;

/// Persists token rows. Rows are looked up by hash, never by plaintext.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, record: &TokenRecord) -> Result<(), DatabaseError>;

    async fn find_by_hash(&self, hash: &str) -> Result<Option<TokenRecord>, DatabaseError>;

    async fn delete_all_for_user(&self, scope: TokenScope, user_id: i64) -> Result<u64, DatabaseError>;
}

#[async_trait]
impl TokenStore for PgStore {
    async fn insert(&self, record: &TokenRecord) -> Result<(), DatabaseError> {
        self.call(async {
            sqlx::query("INSERT INTO tokens (hash, user_id, expiry, scope) VALUES ($1, $2, $3, $4)")
                .bind(&record.hash)
                .bind(record.user_id)
                .bind(record.expiry)
                .bind(record.scope.as_str())
                .execute(self.pool())
                .await?;
            Ok::<_, DatabaseError>(())
        })
        .await
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<TokenRecord>, DatabaseError> {
        let row = self
            .call(async {
                let row = sqlx::query_as::<_, (String, i64, DateTime<Utc>, String)>(
                    "SELECT hash, user_id, expiry, scope FROM tokens WHERE hash = $1",
                )
                .bind(hash)
                .fetch_optional(self.pool())
                .await?;
                Ok::<_, DatabaseError>(row)
            })
            .await?;

        row.map(|(hash, user_id, expiry, scope)| {
            let scope = scope
                .parse::<TokenScope>()
                .map_err(|e| DatabaseError::Corrupt(e.to_string()))?;
            Ok(TokenRecord { hash, user_id, expiry, scope })
        })
        .transpose()
    }

    async fn delete_all_for_user(&self, scope: TokenScope, user_id: i64) -> Result<u64, DatabaseError> {
        self.call(async {
            let result = sqlx::query("DELETE FROM tokens WHERE scope = $1 AND user_id = $2")
                .bind(scope.as_str())
                .bind(user_id)
                .execute(self.pool())
                .await?;
            Ok::<_, DatabaseError>(result.rows_affected())
        })
        .await
    }
}
