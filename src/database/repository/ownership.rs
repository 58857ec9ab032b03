use sqlx::PgPool;

use crate::database::manager::DatabaseError;

/// Result of a delete whose predicate carries the owner. "Not found" and
/// "owned by someone else" are the same outcome on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFoundOrForbidden,
}

impl DeleteOutcome {
    pub fn from_rows_affected(rows: u64) -> Self {
        if rows > 0 {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFoundOrForbidden
        }
    }
}

/// Table whose rows belong to one user
#[derive(Debug, Clone, Copy)]
pub struct OwnedTable {
    pub table: &'static str,
    pub owner_column: &'static str,
}

pub const COMMENTS: OwnedTable = OwnedTable { table: "comments", owner_column: "user_id" };

pub struct OwnershipGuard;

impl OwnershipGuard {
    pub fn delete_sql(owned: &OwnedTable) -> String {
        format!(
            "DELETE FROM \"{}\" WHERE id = $1 AND \"{}\" = $2",
            owned.table, owned.owner_column
        )
    }

    /// Deletes in one statement with both id and owner in the predicate, so
    /// there is no window between checking ownership and deleting.
    pub async fn delete(
        pool: &PgPool,
        owned: &OwnedTable,
        resource_id: i64,
        actor_id: i64,
    ) -> Result<DeleteOutcome, DatabaseError> {
        let result = sqlx::query(&Self::delete_sql(owned))
            .bind(resource_id)
            .bind(actor_id)
            .execute(pool)
            .await?;
        Ok(DeleteOutcome::from_rows_affected(result.rows_affected()))
    }
}
