use axum::extract::{Extension, State};

use crate::api::{BookPage, CreateBookRequest, ListBooksQuery};
use crate::database::Book;
use crate::error::{ApiJson, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /books - filtered, paginated listing
///
/// Query: `title`, `author` (case-insensitive substring), `category` (exact),
/// `rating` (minimum), `page` (default 1), `limit` (default 10).
pub async fn books_get(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListBooksQuery>,
) -> ApiResult<BookPage> {
    let page = state.catalog.list(query).await?;
    Ok(ApiResponse::success(page))
}

/// POST /books - create a book owned by the caller
pub async fn books_post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(request): ApiJson<CreateBookRequest>,
) -> ApiResult<Book> {
    let book = state.catalog.create(auth_user.user_id, request).await?;
    Ok(ApiResponse::created(book))
}
