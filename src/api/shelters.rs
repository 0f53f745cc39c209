//! Shelter API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::nullable;
use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreateShelterInput, Shelter, UpdateShelterInput};
use crate::services::ShelterServiceError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ShelterResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub address: String,
    /// Town id
    pub town: Option<i64>,
}

impl From<Shelter> for ShelterResponse {
    fn from(shelter: Shelter) -> Self {
        Self {
            id: shelter.id,
            name: shelter.name,
            slug: shelter.slug,
            address: shelter.address,
            town: shelter.town_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateShelterRequest {
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub address: String,
    pub town: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateShelterRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub town: Option<Option<i64>>,
}

impl From<ShelterServiceError> for ApiError {
    fn from(error: ShelterServiceError) -> Self {
        match error {
            ShelterServiceError::NotFound(slug) => {
                ApiError::not_found(format!("Shelter not found: {}", slug))
            }
            ShelterServiceError::DuplicateSlug(slug) => {
                ApiError::conflict(format!("Shelter with slug '{}' already exists", slug))
            }
            ShelterServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ShelterServiceError::InternalError(e) => ApiError::internal(format!("{:#}", e)),
        }
    }
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_shelters))
        .route("/{slug}", get(get_shelter))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_shelter))
        .route("/{slug}", patch(update_shelter).delete(delete_shelter))
}

async fn list_shelters(State(state): State<AppState>) -> Result<Json<Vec<ShelterResponse>>, ApiError> {
    let shelters = state.shelter_service.list().await?;
    Ok(Json(shelters.into_iter().map(Into::into).collect()))
}

async fn get_shelter(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ShelterResponse>, ApiError> {
    Ok(Json(state.shelter_service.get_by_slug(&slug).await?.into()))
}

async fn create_shelter(
    State(state): State<AppState>,
    Json(body): Json<CreateShelterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let shelter = state
        .shelter_service
        .create(CreateShelterInput {
            name: body.name,
            slug: body.slug,
            address: body.address,
            town_id: body.town,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ShelterResponse::from(shelter))))
}

async fn update_shelter(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<UpdateShelterRequest>,
) -> Result<Json<ShelterResponse>, ApiError> {
    let shelter = state
        .shelter_service
        .update(
            &slug,
            UpdateShelterInput {
                name: body.name,
                slug: body.slug,
                address: body.address,
                town_id: body.town,
            },
        )
        .await?;
    Ok(Json(shelter.into()))
}

async fn delete_shelter(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.shelter_service.delete(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
