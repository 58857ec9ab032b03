use std::sync::Arc;
use tracing::{info, Span};

use super::error::ServiceError;
use crate::database::models::rating::{MAX_SCORE, MIN_SCORE};
use crate::database::models::{NewRating, Rating, RatingSummary};
use crate::database::repository::RatingStore;

/// Records ratings and keeps each book's derived average and count equal to
/// the aggregate over its persisted ratings.
pub struct RatingAggregator {
    ratings: Arc<dyn RatingStore>,
    span: Span,
}

impl RatingAggregator {
    pub fn new(ratings: Arc<dyn RatingStore>, span: Span) -> Self {
        Self { ratings, span }
    }

    pub async fn record_rating(&self, book_id: i64, user_id: i64, score: i32) -> Result<Rating, ServiceError> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(ServiceError::field(
                "rating",
                format!("must be between {} and {}", MIN_SCORE, MAX_SCORE),
            ));
        }

        let (rating, summary) = self
            .ratings
            .insert_and_recompute(&NewRating { user_id, book_id, rating: score })
            .await?
            .ok_or_else(|| ServiceError::NotFound("the requested book could not be found".to_string()))?;

        info!(
            parent: &self.span,
            book_id,
            user_id,
            avg_rating = summary.avg_rating,
            rating_count = summary.rating_count,
            "rating recorded"
        );
        Ok(rating)
    }

    /// Rewrites a book's aggregate from its persisted ratings
    pub async fn recompute(&self, book_id: i64) -> Result<RatingSummary, ServiceError> {
        let summary = self
            .ratings
            .recompute(book_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("the requested book could not be found".to_string()))?;
        info!(parent: &self.span, book_id, rating_count = summary.rating_count, "rating aggregate repaired");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    #[tokio::test]
    async fn rejects_scores_outside_one_to_five_before_writing() {
        let store = Arc::new(MemoryStore::new());
        let book = store.add_book("Dune", "Herbert", 15.0, 3);
        let aggregator = RatingAggregator::new(store.clone(), Span::none());

        for score in [0, 6, -1] {
            let err = aggregator.record_rating(book.id, 1, score).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation { .. }), "score {score}");
        }
        assert_eq!(store.rating_count(), 0);

        aggregator.record_rating(book.id, 1, 1).await.unwrap();
        aggregator.record_rating(book.id, 2, 5).await.unwrap();
        assert_eq!(store.rating_count(), 2);
    }

    #[tokio::test]
    async fn aggregate_tracks_every_persisted_rating() {
        let store = Arc::new(MemoryStore::new());
        let book = store.add_book("Dune", "Herbert", 15.0, 3);
        let aggregator = RatingAggregator::new(store.clone(), Span::none());

        for (user, score) in [(1, 5), (2, 4), (3, 1), (4, 2)] {
            aggregator.record_rating(book.id, user, score).await.unwrap();
        }
        let stored = store.book(book.id).unwrap();
        assert_eq!(stored.rating_count, 4);
        assert!((stored.avg_rating - 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn rating_unknown_book_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let aggregator = RatingAggregator::new(store.clone(), Span::none());

        let err = aggregator.record_rating(99, 1, 3).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(store.rating_count(), 0);
    }

    #[tokio::test]
    async fn recompute_repairs_a_stale_aggregate() {
        let store = Arc::new(MemoryStore::new());
        let book = store.add_book("Dune", "Herbert", 15.0, 3);
        store.add_raw_rating(1, book.id, 2);
        store.add_raw_rating(2, book.id, 4);
        store.set_rating_fields(book.id, 0.0, 0);

        let aggregator = RatingAggregator::new(store.clone(), Span::none());
        let summary = aggregator.recompute(book.id).await.unwrap();
        assert_eq!(summary, RatingSummary { avg_rating: 3.0, rating_count: 2 });
        assert_eq!(store.book(book.id).unwrap().rating_count, 2);
    }
}
