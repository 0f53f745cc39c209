//! Care service API endpoints (`/api/v1/services`)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{CareService, CreateCareServiceInput, UpdateCareServiceInput};
use crate::services::CareServiceError;

#[derive(Debug, Serialize, Deserialize)]
pub struct CareServiceResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl From<CareService> for CareServiceResponse {
    fn from(service: CareService) -> Self {
        Self {
            id: service.id,
            name: service.name,
            slug: service.slug,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCareServiceRequest {
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCareServiceRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
}

impl From<CareServiceError> for ApiError {
    fn from(error: CareServiceError) -> Self {
        match error {
            CareServiceError::NotFound(slug) => ApiError::not_found(format!("Service not found: {}", slug)),
            CareServiceError::DuplicateSlug(slug) => {
                ApiError::conflict(format!("Service with slug '{}' already exists", slug))
            }
            CareServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            CareServiceError::InternalError(e) => ApiError::internal(format!("{:#}", e)),
        }
    }
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services))
        .route("/{slug}", get(get_service))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_service))
        .route("/{slug}", patch(update_service).delete(delete_service))
}

async fn list_services(
    State(state): State<AppState>,
) -> Result<Json<Vec<CareServiceResponse>>, ApiError> {
    let services = state.care_services.list().await?;
    Ok(Json(services.into_iter().map(Into::into).collect()))
}

async fn get_service(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CareServiceResponse>, ApiError> {
    Ok(Json(state.care_services.get_by_slug(&slug).await?.into()))
}

async fn create_service(
    State(state): State<AppState>,
    Json(body): Json<CreateCareServiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = state
        .care_services
        .create(CreateCareServiceInput {
            name: body.name,
            slug: body.slug,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(CareServiceResponse::from(service))))
}

async fn update_service(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<UpdateCareServiceRequest>,
) -> Result<Json<CareServiceResponse>, ApiError> {
    let service = state
        .care_services
        .update(
            &slug,
            UpdateCareServiceInput {
                name: body.name,
                slug: body.slug,
            },
        )
        .await?;
    Ok(Json(service.into()))
}

async fn delete_service(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.care_services.delete(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
