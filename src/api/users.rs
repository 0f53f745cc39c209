//! User API endpoints
//!
//! - GET/POST /api/v1/users (admin)
//! - GET/PATCH/DELETE /api/v1/users/{username} (admin)
//! - GET/PATCH /api/v1/users/me (any signed-in user)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{CreateUserInput, UpdateUserInput, User, UserRole};
use crate::services::UserServiceError;

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            role: user.role.to_string(),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub bio: String,
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<String>,
}

impl UpdateUserRequest {
    fn into_input(self) -> Result<UpdateUserInput, ApiError> {
        Ok(UpdateUserInput {
            role: parse_role(self.role.as_deref())?,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            bio: self.bio,
        })
    }
}

fn parse_role(role: Option<&str>) -> Result<Option<UserRole>, ApiError> {
    role.map(|r| r.parse::<UserRole>())
        .transpose()
        .map_err(|e| ApiError::validation_error(e.to_string()))
}

impl From<UserServiceError> for ApiError {
    fn from(error: UserServiceError) -> Self {
        match error {
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::UserExists(msg) => ApiError::conflict(msg),
            UserServiceError::NotFound(who) => ApiError::not_found(format!("User not found: {}", who)),
            UserServiceError::InvalidCode => ApiError::with_details(
                "VALIDATION_ERROR",
                "Invalid or expired confirmation code",
                serde_json::json!({"field": "confirmation_code"}),
            ),
            UserServiceError::RateLimited => ApiError::with_details(
                "RATE_LIMIT",
                "Too many attempts, try again later",
                serde_json::json!({"retry_after": 900}),
            ),
            UserServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            UserServiceError::InternalError(e) => ApiError::internal(format!("{:#}", e)),
        }
    }
}

/// Routes for administrators
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/{username}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// Routes for the signed-in user's own account
pub fn me_router() -> Router<AppState> {
    Router::new().route("/me", get(get_me).patch(update_me))
}

/// GET /api/v1/users
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.user_service.list().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// POST /api/v1/users
async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateUserInput {
        role: parse_role(body.role.as_deref())?,
        username: body.username,
        email: body.email,
        first_name: body.first_name,
        last_name: body.last_name,
        bio: body.bio,
    };
    let user = state.user_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// GET /api/v1/users/{username}
async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.user_service.get_by_username(&username).await?;
    Ok(Json(user.into()))
}

/// PATCH /api/v1/users/{username}
async fn update_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.user_service.update(&username, body.into_input()?).await?;
    Ok(Json(user.into()))
}

/// DELETE /api/v1/users/{username}
async fn delete_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.user_service.delete(&username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/users/me
async fn get_me(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(user.0.into())
}

/// PATCH /api/v1/users/me
async fn update_me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let updated = state.user_service.update_me(&user.0, body.into_input()?).await?;
    Ok(Json(updated.into()))
}
