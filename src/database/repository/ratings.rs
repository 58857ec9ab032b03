use async_trait::async_trait;

use super::PgStore;
use crate::database::manager::DatabaseError;
use crate::database::models::{NewRating, Rating, RatingSummary};

#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Inserts the rating and rewrites the book's aggregate from all its
    /// persisted ratings, atomically. `None` when the book does not exist.
    async fn insert_and_recompute(&self, rating: &NewRating) -> Result<Option<(Rating, RatingSummary)>, DatabaseError>;

    /// Rewrites a book's aggregate from persisted ratings (repair pass).
    async fn recompute(&self, book_id: i64) -> Result<Option<RatingSummary>, DatabaseError>;
}

const RECOMPUTE_SQL: &str = "UPDATE books SET \
       avg_rating = COALESCE((SELECT AVG(rating)::float8 FROM ratings WHERE book_id = $1), 0), \
       rating_count = (SELECT COUNT(*)::int4 FROM ratings WHERE book_id = $1) \
     WHERE id = $1 \
     RETURNING avg_rating, rating_count";

#[async_trait]
impl RatingStore for PgStore {
    async fn insert_and_recompute(&self, rating: &NewRating) -> Result<Option<(Rating, RatingSummary)>, DatabaseError> {
        self.call(async {
            let mut tx = self.pool().begin().await?;

            // Serializes raters of the same book so the recompute below
            // always sees every committed rating.
            let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE id = $1 FOR UPDATE")
                .bind(rating.book_id)
                .fetch_optional(&mut *tx)
                .await?;
            if locked.is_none() {
                return Ok(None);
            }

            let inserted = sqlx::query_as::<_, Rating>(
                "INSERT INTO ratings (user_id, book_id, rating) VALUES ($1, $2, $3) \
                 RETURNING id, user_id, book_id, rating, created_at",
            )
            .bind(rating.user_id)
            .bind(rating.book_id)
            .bind(rating.rating)
            .fetch_one(&mut *tx)
            .await?;

            let summary = sqlx::query_as::<_, RatingSummary>(RECOMPUTE_SQL)
                .bind(rating.book_id)
                .fetch_one(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok::<_, DatabaseError>(Some((inserted, summary)))
        })
        .await
    }

    async fn recompute(&self, book_id: i64) -> Result<Option<RatingSummary>, DatabaseError> {
        self.call(async {
            let summary = sqlx::query_as::<_, RatingSummary>(RECOMPUTE_SQL)
                .bind(book_id)
                .fetch_optional(self.pool())
                .await?;
            Ok::<_, DatabaseError>(summary)
        })
        .await
    }
}
