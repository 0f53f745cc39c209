//! Town API endpoints
//!
//! Towns are returned with their country nested and take the country's
//! slug on input.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{nullable, SearchQuery};
use crate::api::countries::CountryResponse;
use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreateTownInput, TownWithCountry, UpdateTownInput};
use crate::services::TownServiceError;

#[derive(Debug, Serialize, Deserialize)]
pub struct TownResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub country: Option<CountryResponse>,
}

impl From<TownWithCountry> for TownResponse {
    fn from(value: TownWithCountry) -> Self {
        Self {
            id: value.town.id,
            name: value.town.name,
            slug: value.town.slug,
            country: value.country.map(Into::into),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTownRequest {
    pub name: String,
    pub slug: Option<String>,
    /// Country slug
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTownRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub country: Option<Option<String>>,
}

impl From<TownServiceError> for ApiError {
    fn from(error: TownServiceError) -> Self {
        match error {
            TownServiceError::NotFound(slug) => ApiError::not_found(format!("Town not found: {}", slug)),
            TownServiceError::DuplicateSlug(slug) => {
                ApiError::conflict(format!("Town with slug '{}' already exists", slug))
            }
            TownServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            TownServiceError::InternalError(e) => ApiError::internal(format!("{:#}", e)),
        }
    }
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_towns))
        .route("/{slug}", get(get_town))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_town))
        .route("/{slug}", patch(update_town).delete(delete_town))
}

async fn list_towns(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<TownResponse>>, ApiError> {
    let towns = state.town_service.list(query.search.as_deref()).await?;
    Ok(Json(towns.into_iter().map(Into::into).collect()))
}

async fn get_town(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<TownResponse>, ApiError> {
    Ok(Json(state.town_service.get_by_slug(&slug).await?.into()))
}

async fn create_town(
    State(state): State<AppState>,
    Json(body): Json<CreateTownRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let town = state
        .town_service
        .create(CreateTownInput {
            name: body.name,
            slug: body.slug,
            country: body.country,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(TownResponse::from(town))))
}

async fn update_town(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<UpdateTownRequest>,
) -> Result<Json<TownResponse>, ApiError> {
    let town = state
        .town_service
        .update(
            &slug,
            UpdateTownInput {
                name: body.name,
                slug: body.slug,
                country: body.country,
            },
        )
        .await?;
    Ok(Json(town.into()))
}

async fn delete_town(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.town_service.delete(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
