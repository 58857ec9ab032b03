// /api/v1/books/*

use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::models::{Book, BookChanges, NewBook, Purchase};
use crate::filter::{BookListParams, Page};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody, QueryParams, ResourceId};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuyInput {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: &'static str,
}

/// GET /api/v1/books/list - filtered, sorted, paginated catalog
pub async fn list_get(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<BookListParams>,
) -> ApiResult<Page<Book>> {
    let page = state.catalog.list(params).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/v1/books
pub async fn book_post(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewBook>,
) -> ApiResult<Book> {
    let book = state.catalog.create(input).await?;
    Ok(ApiResponse::created(book))
}

/// GET /api/v1/books/:id
pub async fn book_get(State(state): State<AppState>, ResourceId(id): ResourceId) -> ApiResult<Book> {
    let book = state.catalog.get(id).await?;
    Ok(ApiResponse::success(book))
}

/// PUT /api/v1/books/:id - partial update, absent fields are kept
pub async fn book_put(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    JsonBody(changes): JsonBody<BookChanges>,
) -> ApiResult<Book> {
    let book = state.catalog.update(id, changes).await?;
    Ok(ApiResponse::success(book))
}

/// DELETE /api/v1/books/:id
pub async fn book_delete(State(state): State<AppState>, ResourceId(id): ResourceId) -> ApiResult<Deleted> {
    state.catalog.delete(id).await?;
    Ok(ApiResponse::success(Deleted { message: "book successfully deleted" }))
}

/// POST /api/v1/books/buy - buy one copy by title
pub async fn buy_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<BuyInput>,
) -> ApiResult<Purchase> {
    let purchase = state.purchases.buy(auth.id(), &input.title).await?;
    Ok(ApiResponse::created(purchase))
}
