//! Authentication API endpoints
//!
//! - POST /api/v1/auth/email - Request a confirmation code
//! - POST /api/v1/auth/token - Exchange the code for a session token
//! - POST /api/v1/auth/logout - End the current session

use axum::{extract::State, http::StatusCode, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, SessionToken};

#[derive(Debug, Serialize, Deserialize)]
pub struct CodeRequest {
    pub email: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub confirmation_code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Routes that work without a session
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/email", post(request_code))
        .route("/token", post(exchange_code))
}

/// Routes that need a session (auth middleware applied by the caller)
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/logout", post(logout))
}

/// POST /api/v1/auth/email
///
/// Creates the account on first use; echoes the account's email and username.
async fn request_code(
    State(state): State<AppState>,
    Json(body): Json<CodeRequest>,
) -> Result<Json<CodeRequest>, ApiError> {
    let user = state
        .user_service
        .request_code(&body.email, &body.username)
        .await?;

    Ok(Json(CodeRequest {
        email: user.email,
        username: user.username,
    }))
}

/// POST /api/v1/auth/token
async fn exchange_code(
    State(state): State<AppState>,
    Json(body): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let session = state
        .user_service
        .exchange_code(&body.email, &body.confirmation_code)
        .await?;

    Ok(Json(TokenResponse { token: session.id }))
}

/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
) -> Result<StatusCode, ApiError> {
    state.user_service.logout(&token.0).await?;
    Ok(StatusCode::NO_CONTENT)
}
