use async_trait::async_trait;

use super::PgStore;
use crate::database::manager::DatabaseError;
use crate::database::models::{Purchase, PurchaseOutcome};

#[async_trait]
pub trait PurchaseStore: Send + Sync {
    /// Takes one unit of stock and records the sale. Stock never goes
    /// below zero; on `OutOfStock` nothing is written.
    async fn purchase_one(&self, user_id: i64, book_id: i64) -> Result<PurchaseOutcome, DatabaseError>;

    /// Newest first
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Purchase>, DatabaseError>;
}

#[async_trait]
impl PurchaseStore for PgStore {
    async fn purchase_one(&self, user_id: i64, book_id: i64) -> Result<PurchaseOutcome, DatabaseError> {
        self.call(async {
            let mut tx = self.pool().begin().await?;

            let price: Option<f64> = sqlx::query_scalar(
                "UPDATE books SET stock_quantity = stock_quantity - 1, updated_at = NOW() \
                 WHERE id = $1 AND stock_quantity > 0 RETURNING price",
            )
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(price) = price else {
                let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE id = $1)")
                    .bind(book_id)
                    .fetch_one(&mut *tx)
                    .await?;
                tx.rollback().await?;
                let outcome = if exists { PurchaseOutcome::OutOfStock } else { PurchaseOutcome::BookNotFound };
                return Ok(outcome);
            };

            let purchase = sqlx::query_as::<_, Purchase>(
                "INSERT INTO purchases (user_id, book_id, quantity, total_price) VALUES ($1, $2, 1, $3) \
                 RETURNING id, user_id, book_id, quantity, total_price, created_at",
            )
            .bind(user_id)
            .bind(book_id)
            .bind(price)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok::<_, DatabaseError>(PurchaseOutcome::Completed(purchase))
        })
        .await
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Purchase>, DatabaseError> {
        self.call(async {
            let purchases = sqlx::query_as::<_, Purchase>(
                "SELECT id, user_id, book_id, quantity, total_price, created_at FROM purchases \
                 WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            )
            .bind(user_id)
            .fetch_all(self.pool())
            .await?;
            Ok::<_, DatabaseError>(purchases)
        })
        .await
    }
}
