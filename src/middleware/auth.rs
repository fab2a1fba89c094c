use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::InvalidToken;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller, inserted into request extensions by `jwt_auth_middleware`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// Reject requests without a valid bearer token before they reach a handler
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = extract_bearer_token(&headers)
        .and_then(|token| state.tokens.verify(token))
        .map_err(|reason| {
            warn!("Rejected {} {}: {}", request.method(), request.uri().path(), reason);
            ApiError::from(reason)
        })?;

    request.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, InvalidToken> {
    let value = headers.get(AUTHORIZATION).ok_or(InvalidToken::Missing)?;
    let value = value.to_str().map_err(|_| InvalidToken::Malformed)?;

    let token = value.strip_prefix("Bearer ").ok_or(InvalidToken::Malformed)?.trim();
    if token.is_empty() {
        return Err(InvalidToken::Missing);
    }
    Ok(token)
}
