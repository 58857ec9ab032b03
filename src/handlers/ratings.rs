// POST /api/v1/ratings

use axum::{extract::State, Extension};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::Rating;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RatingInput {
    pub book_id: i64,
    pub rating: i32,
}

pub async fn rating_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<RatingInput>,
) -> ApiResult<Rating> {
    let rating = state
        .ratings
        .record_rating(input.book_id, auth.id(), input.rating)
        .await?;
    Ok(ApiResponse::created(rating))
}
