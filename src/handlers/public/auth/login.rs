use axum::extract::State;

use crate::api::{AuthResponse, Credentials};
use crate::error::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /auth/login - exchange email and password for a bearer token
///
/// Unknown email and wrong password both answer 401 "Invalid credentials".
pub async fn login_post(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> ApiResult<AuthResponse> {
    let session = state.auth.login(credentials).await?;
    Ok(ApiResponse::success(session))
}
