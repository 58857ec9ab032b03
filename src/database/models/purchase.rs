use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One unit sale. Written only after the book's stock was decremented.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Purchase {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub quantity: i32,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseOutcome {
    Completed(Purchase),
    /// Stock was zero; nothing was written
    OutOfStock,
    BookNotFound,
}
