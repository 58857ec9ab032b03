use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Rating {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct NewRating {
    pub user_id: i64,
    pub book_id: i64,
    pub rating: i32,
}

/// Aggregate written back to the book after recomputation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, FromRow)]
pub struct RatingSummary {
    pub avg_rating: f64,
    pub rating_count: i32,
}

impl RatingSummary {
    /// Mean and count over every persisted score for one book.
    pub fn from_scores(scores: &[i32]) -> Self {
        if scores.is_empty() {
            return Self { avg_rating: 0.0, rating_count: 0 };
        }
        let total: i64 = scores.iter().map(|s| *s as i64).sum();
        Self {
            avg_rating: total as f64 / scores.len() as f64,
            rating_count: scores.len() as i32,
        }
    }
}
