//! API middleware
//!
//! Contains:
//! - Application state shared by every handler
//! - The JSON error type handlers return
//! - Authentication (session token validation)
//! - Authorization (admin check)

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::db::repositories::{
    SqlxCareServiceRepository, SqlxCountryRepository, SqlxPetRepository, SqlxSessionRepository,
    SqlxShelterRepository, SqlxTownRepository, SqlxTransactionRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::User;
use crate::services::{
    AuthRateLimiter, CareServiceCatalog, CodeSender, CountryService, PetService, ShelterService,
    TownService, TransactionService, UserService,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub country_service: Arc<CountryService>,
    pub town_service: Arc<TownService>,
    pub shelter_service: Arc<ShelterService>,
    pub pet_service: Arc<PetService>,
    pub care_services: Arc<CareServiceCatalog>,
    pub transaction_service: Arc<TransactionService>,
}

impl AppState {
    /// Wire every repository and service onto one pool.
    pub fn new(
        pool: DynDatabasePool,
        sender: Arc<dyn CodeSender>,
        rate_limiter: AuthRateLimiter,
        auth: &AuthConfig,
    ) -> Self {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let country_repo = SqlxCountryRepository::boxed(pool.clone());
        let town_repo = SqlxTownRepository::boxed(pool.clone());
        let shelter_repo = SqlxShelterRepository::boxed(pool.clone());
        let pet_repo = SqlxPetRepository::boxed(pool.clone());
        let care_service_repo = SqlxCareServiceRepository::boxed(pool.clone());
        let transaction_repo = SqlxTransactionRepository::boxed(pool);

        Self {
            user_service: Arc::new(UserService::with_auth_config(
                user_repo.clone(),
                session_repo,
                sender,
                rate_limiter,
                auth,
            )),
            country_service: Arc::new(CountryService::new(country_repo.clone())),
            town_service: Arc::new(TownService::new(town_repo.clone(), country_repo)),
            shelter_service: Arc::new(ShelterService::new(shelter_repo.clone(), town_repo.clone())),
            pet_service: Arc::new(PetService::new(pet_repo.clone(), shelter_repo, town_repo.clone())),
            care_services: Arc::new(CareServiceCatalog::new(care_service_repo.clone())),
            transaction_service: Arc::new(TransactionService::new(
                transaction_repo,
                user_repo,
                pet_repo,
                care_service_repo,
                town_repo,
            )),
        }
    }
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Session token of the current request, set by [`require_auth`]
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new("RATE_LIMIT", message)
    }

    /// The cause is logged; clients only see a generic message.
    pub fn internal(error: impl std::fmt::Display) -> Self {
        tracing::error!("Internal error: {}", error);
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "RATE_LIMIT" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// Extract the bearer token from the Authorization header
fn extract_session_token(request: &Request) -> Option<String> {
    let value = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    request.extensions_mut().insert(SessionToken(token));
    Ok(next.run(request).await)
}

/// Admin authorization middleware; runs after [`require_auth`]
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_admin() {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
