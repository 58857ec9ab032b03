use std::sync::Arc;
use tracing::{info, warn, Span};

use super::error::ServiceError;
use crate::database::models::{Comment, NewComment};
use crate::database::repository::{BookStore, CommentStore, DeleteOutcome};

const MAX_CONTENT_LEN: usize = 1000;

pub struct CommentService {
    comments: Arc<dyn CommentStore>,
    books: Arc<dyn BookStore>,
    span: Span,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentStore>, books: Arc<dyn BookStore>, span: Span) -> Self {
        Self { comments, books, span }
    }

    pub async fn create(&self, user_id: i64, book_id: i64, content: &str) -> Result<Comment, ServiceError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ServiceError::field("content", "must be provided"));
        }
        if content.len() > MAX_CONTENT_LEN {
            return Err(ServiceError::field(
                "content",
                format!("must not be more than {} bytes long", MAX_CONTENT_LEN),
            ));
        }
        if self.books.get(book_id).await?.is_none() {
            return Err(ServiceError::NotFound("the requested book could not be found".to_string()));
        }

        let comment = self
            .comments
            .insert(&NewComment { user_id, book_id, content: content.to_string() })
            .await?;
        info!(parent: &self.span, comment_id = comment.id, book_id, user_id, "comment created");
        Ok(comment)
    }

    pub async fn list(&self, book_id: i64) -> Result<Vec<Comment>, ServiceError> {
        Ok(self.comments.list_for_book(book_id).await?)
    }

    /// Deletes the comment only as its author. A missing comment and one owned
    /// by someone else produce the same error.
    pub async fn delete(&self, comment_id: i64, user_id: i64) -> Result<(), ServiceError> {
        match self.comments.delete_owned(comment_id, user_id).await? {
            DeleteOutcome::Deleted => {
                info!(parent: &self.span, comment_id, user_id, "comment deleted");
                Ok(())
            }
            DeleteOutcome::NotFoundOrForbidden => {
                warn!(parent: &self.span, comment_id, user_id, "comment delete matched no owned row");
                Err(ServiceError::Forbidden("You do not have permission to delete this comment.".to_string()))
            }
        }
    }
}
