use axum::extract::State;
use axum::Json;

use crate::api::dto::{LoginRequest, TokenResponse, UserDto, WhoAmIDto};
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// POST /auth/login - exchange email and password for a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let outcome = state.auth.login(body.username.trim(), &body.password).await?;
    Ok(ApiResponse::success(TokenResponse {
        access_token: outcome.access_token,
        token_type: "bearer",
        expires_in: outcome.expires_in,
        user: UserDto::from_entity(outcome.user),
    }))
}

/// GET /auth/whoami - claims of the current token
pub async fn whoami(AuthUser(claims): AuthUser) -> ApiResult<WhoAmIDto> {
    Ok(ApiResponse::success(WhoAmIDto::from_claims(claims)))
}
