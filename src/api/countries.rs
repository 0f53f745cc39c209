//! Country API endpoints
//!
//! - GET /api/v1/countries?search= - List countries
//! - GET /api/v1/countries/{slug} - Get one country
//! - POST, PATCH, DELETE - Admin only

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::SearchQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::models::{Country, CreateCountryInput, UpdateCountryInput};
use crate::services::CountryServiceError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl From<Country> for CountryResponse {
    fn from(country: Country) -> Self {
        Self {
            id: country.id,
            name: country.name,
            slug: country.slug,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCountryRequest {
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCountryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
}

impl From<CountryServiceError> for ApiError {
    fn from(error: CountryServiceError) -> Self {
        match error {
            CountryServiceError::NotFound(slug) => {
                ApiError::not_found(format!("Country not found: {}", slug))
            }
            CountryServiceError::DuplicateSlug(slug) => {
                ApiError::conflict(format!("Country with slug '{}' already exists", slug))
            }
            CountryServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            CountryServiceError::InternalError(e) => ApiError::internal(format!("{:#}", e)),
        }
    }
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_countries))
        .route("/{slug}", get(get_country))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_country))
        .route("/{slug}", patch(update_country).delete(delete_country))
}

async fn list_countries(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<CountryResponse>>, ApiError> {
    let countries = state.country_service.list(query.search.as_deref()).await?;
    Ok(Json(countries.into_iter().map(Into::into).collect()))
}

async fn get_country(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CountryResponse>, ApiError> {
    Ok(Json(state.country_service.get_by_slug(&slug).await?.into()))
}

async fn create_country(
    State(state): State<AppState>,
    Json(body): Json<CreateCountryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let country = state
        .country_service
        .create(CreateCountryInput {
            name: body.name,
            slug: body.slug,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(CountryResponse::from(country))))
}

async fn update_country(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<UpdateCountryRequest>,
) -> Result<Json<CountryResponse>, ApiError> {
    let country = state
        .country_service
        .update(
            &slug,
            UpdateCountryInput {
                name: body.name,
                slug: body.slug,
            },
        )
        .await?;
    Ok(Json(country.into()))
}

async fn delete_country(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.country_service.delete(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
