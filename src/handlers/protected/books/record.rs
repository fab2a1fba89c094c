use axum::extract::State;

use crate::api::UpdateBookRequest;
use crate::database::Book;
use crate::error::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /books/:id
pub async fn book_get(State(state): State<AppState>, ApiPath(id): ApiPath<String>) -> ApiResult<Book> {
    let book = state.catalog.get(&id).await?;
    Ok(ApiResponse::success(book))
}

/// PUT /books/:id - partial update; absent fields keep their values
pub async fn book_put(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<UpdateBookRequest>,
) -> ApiResult<Book> {
    let book = state.catalog.update(&id, request).await?;
    Ok(ApiResponse::success(book))
}

/// DELETE /books/:id - 204 with an empty body
pub async fn book_delete(State(state): State<AppState>, ApiPath(id): ApiPath<String>) -> ApiResult<()> {
    state.catalog.delete(&id).await?;
    Ok(ApiResponse::no_content())
}
