// /api/v1/comments

use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::models::Comment;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody, QueryParams, ResourceId};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentInput {
    pub book_id: i64,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentListParams {
    pub book_id: i64,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: &'static str,
}

pub async fn comment_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<CommentInput>,
) -> ApiResult<Comment> {
    let comment = state.comments.create(auth.id(), input.book_id, &input.content).await?;
    Ok(ApiResponse::created(comment))
}

pub async fn comments_get(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<CommentListParams>,
) -> ApiResult<Vec<Comment>> {
    let comments = state.comments.list(params.book_id).await?;
    Ok(ApiResponse::success(comments))
}

/// DELETE /api/v1/comments/:id - only the author may delete
pub async fn comment_delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ResourceId(id): ResourceId,
) -> ApiResult<Deleted> {
    state.comments.delete(id, auth.id()).await?;
    Ok(ApiResponse::success(Deleted { message: "comment successfully deleted" }))
}
