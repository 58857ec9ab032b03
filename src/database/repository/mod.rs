use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::{FromRow, PgPool, Postgres};
use std::time::Duration;

use crate::database::manager::{bounded, DatabaseError, DatabaseManager};
use crate::filter::SqlParam;

pub mod books;
pub mod comments;
pub mod ownership;
pub mod permissions;
pub mod purchases;
pub mod ratings;
pub mod tokens;
pub mod users;

pub use books::BookStore;
pub use comments::CommentStore;
pub use ownership::{DeleteOutcome, OwnedTable, OwnershipGuard};
pub use permissions::PermissionStore;
pub use purchases::PurchaseStore;
pub use ratings::RatingStore;
pub use tokens::TokenStore;
pub use users::UserStore;

#[async_trait]
pub trait StorageHealth: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// Postgres-backed implementation of every store trait. Each call is
/// bounded by `timeout`; the pool is the only shared resource.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub(crate) async fn call<T, F>(&self, fut: F) -> Result<T, DatabaseError>
    where
        F: std::future::Future<Output = Result<T, DatabaseError>>,
    {
        bounded(self.timeout, fut).await
    }
}

#[async_trait]
impl StorageHealth for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool, self.timeout).await
    }
}

/// Binds numbered parameters produced by the filter builder
pub(crate) fn bind_params<'q, O>(
    mut q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    params: &'q [SqlParam],
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    for p in params {
        q = match p {
            SqlParam::Text(s) => q.bind(s.as_str()),
            SqlParam::Float(f) => q.bind(*f),
            SqlParam::Int(i) => q.bind(*i),
        };
    }
    q
}
