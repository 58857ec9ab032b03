use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Column list shared by the listing query and the CRUD queries
pub(crate) const BOOK_COLUMNS: &str =
    "id, created_at, updated_at, title, author, price, stock_quantity, avg_rating, rating_count";

/// Catalog entry. `avg_rating` and `rating_count` are derived from the
/// ratings table and only ever written by the rating recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub author: String,
    pub price: f64,
    pub stock_quantity: i32,
    pub avg_rating: f64,
    pub rating_count: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub price: f64,
    #[serde(default)]
    pub stock_quantity: i32,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub price: Option<f64>,
    pub stock_quantity: Option<i32>,
}
