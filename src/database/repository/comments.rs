use async_trait::async_trait;

use super::ownership::{DeleteOutcome, OwnershipGuard, COMMENTS};
use super::PgStore;
use crate::database::manager::DatabaseError;
use crate::database::models::{Comment, NewComment};

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert(&self, comment: &NewComment) -> Result<Comment, DatabaseError>;

    async fn list_for_book(&self, book_id: i64) -> Result<Vec<Comment>, DatabaseError>;

    /// Deletes only if `user_id` owns the comment
    async fn delete_owned(&self, comment_id: i64, user_id: i64) -> Result<DeleteOutcome, DatabaseError>;
}

#[async_trait]
impl CommentStore for PgStore {
    async fn insert(&self, comment: &NewComment) -> Result<Comment, DatabaseError> {
        self.call(async {
            let created = sqlx::query_as::<_, Comment>(
                "INSERT INTO comments (user_id, book_id, content) VALUES ($1, $2, $3) \
                 RETURNING id, user_id, book_id, content, created_at",
            )
            .bind(comment.user_id)
            .bind(comment.book_id)
            .bind(&comment.content)
            .fetch_one(self.pool())
            .await?;
            Ok::<_, DatabaseError>(created)
        })
        .await
    }

    async fn list_for_book(&self, book_id: i64) -> Result<Vec<Comment>, DatabaseError> {
        self.call(async {
            let comments = sqlx::query_as::<_, Comment>(
                "SELECT id, user_id, book_id, content, created_at FROM comments \
                 WHERE book_id = $1 ORDER BY created_at ASC, id ASC",
            )
            .bind(book_id)
            .fetch_all(self.pool())
            .await?;
            Ok::<_, DatabaseError>(comments)
        })
        .await
    }

    async fn delete_owned(&self, comment_id: i64, user_id: i64) -> Result<DeleteOutcome, DatabaseError> {
        self.call(OwnershipGuard::delete(self.pool(), &COMMENTS, comment_id, user_id)).await
    }
}
