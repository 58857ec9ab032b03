use std::sync::Arc;
use tracing::{info, warn, Span};

use super::error::ServiceError;
use crate::database::models::{Purchase, PurchaseOutcome};
use crate::database::repository::{BookStore, PurchaseStore};

pub struct PurchaseService {
    books: Arc<dyn BookStore>,
    purchases: Arc<dyn PurchaseStore>,
    span: Span,
}

impl PurchaseService {
    pub fn new(books: Arc<dyn BookStore>, purchases: Arc<dyn PurchaseStore>, span: Span) -> Self {
        Self { books, purchases, span }
    }

    /// Buys one copy of the book with this exact title
    pub async fn buy(&self, user_id: i64, title: &str) -> Result<Purchase, ServiceError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ServiceError::field("title", "must be provided"));
        }

        let book = self
            .books
            .get_by_title(title)
            .await?
            .ok_or_else(|| ServiceError::NotFound("the requested book could not be found".to_string()))?;

        match self.purchases.purchase_one(user_id, book.id).await? {
            PurchaseOutcome::Completed(purchase) => {
                info!(
                    parent: &self.span,
                    purchase_id = purchase.id,
                    book_id = book.id,
                    user_id,
                    "book purchased"
                );
                Ok(purchase)
            }
            PurchaseOutcome::OutOfStock => {
                warn!(parent: &self.span, book_id = book.id, user_id, "purchase refused, no stock");
                Err(ServiceError::Forbidden("No more books available in stock.".to_string()))
            }
            PurchaseOutcome::BookNotFound => {
                Err(ServiceError::NotFound("the requested book could not be found".to_string()))
            }
        }
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Purchase>, ServiceError> {
        Ok(self.purchases.list_for_user(user_id).await?)
    }
}
