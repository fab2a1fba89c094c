use axum::extract::State;

use crate::api::{AuthResponse, Credentials};
use crate::error::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /auth/signup - register and receive a bearer token (201)
pub async fn signup_post(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> ApiResult<AuthResponse> {
    let session = state.auth.signup(credentials).await?;
    Ok(ApiResponse::created(session))
}
