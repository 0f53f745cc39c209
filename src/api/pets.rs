//! Pet API endpoints
//!
//! - GET /api/v1/pets?name=&gender=&family=&town=&country= - Catalog
//! - GET /api/v1/pets/favorite?town=<slug> - Top of the catalog in one town
//! - GET /api/v1/pets/{id}
//! - POST, PATCH, DELETE - Admin only
//!
//! Every pet carries its derived `rating`, `null` until all four
//! engagement counters are recorded.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::common::nullable;
use crate::api::middleware::{ApiError, AppState};
use crate::catalog::{EngagementCounters, PetFilter};
use crate::models::{CreatePetInput, Gender, PetFamily, PetListing, UpdatePetInput};
use crate::services::PetServiceError;

#[derive(Debug, Serialize, Deserialize)]
pub struct PetResponse {
    pub id: i64,
    pub family: PetFamily,
    pub name: String,
    pub birthday: String,
    pub pub_date: String,
    pub gender: Gender,
    pub breed: String,
    /// Shelter id
    pub shelter: Option<i64>,
    pub taken_home: bool,
    pub in_favorites: Option<u32>,
    pub take_a_walk: Option<u32>,
    pub take_a_home: Option<u32>,
    pub visit_counter: Option<u32>,
    pub rating: Option<u32>,
    /// Slug of the shelter's town
    pub town: Option<String>,
    /// Slug of that town's country
    pub country: Option<String>,
}

impl From<PetListing> for PetResponse {
    fn from(listing: PetListing) -> Self {
        let rating = listing.pet.rating().ok();
        let pet = listing.pet;
        Self {
            id: pet.id,
            family: pet.family,
            name: pet.name,
            birthday: pet.birthday.to_rfc3339(),
            pub_date: pet.pub_date.to_rfc3339(),
            gender: pet.gender,
            breed: pet.breed,
            shelter: pet.shelter_id,
            taken_home: pet.taken_home,
            in_favorites: pet.in_favorites,
            take_a_walk: pet.take_a_walk,
            take_a_home: pet.take_a_home,
            visit_counter: pet.visit_counter,
            rating,
            town: listing.town_slug,
            country: listing.country_slug,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePetRequest {
    pub family: Option<PetFamily>,
    pub name: String,
    pub birthday: Option<DateTime<Utc>>,
    pub gender: Option<Gender>,
    pub breed: Option<String>,
    pub shelter: Option<i64>,
    #[serde(default)]
    pub taken_home: bool,
    pub in_favorites: Option<u32>,
    pub take_a_walk: Option<u32>,
    pub take_a_home: Option<u32>,
    pub visit_counter: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePetRequest {
    pub family: Option<PetFamily>,
    pub name: Option<String>,
    pub birthday: Option<DateTime<Utc>>,
    pub gender: Option<Gender>,
    pub breed: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub shelter: Option<Option<i64>>,
    pub taken_home: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub in_favorites: Option<Option<u32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub take_a_walk: Option<Option<u32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub take_a_home: Option<Option<u32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub visit_counter: Option<Option<u32>>,
}

#[derive(Debug, Deserialize)]
pub struct FavoriteQuery {
    /// Town slug
    pub town: Option<String>,
}

impl TryFrom<CreatePetRequest> for CreatePetInput {
    type Error = ApiError;

    fn try_from(body: CreatePetRequest) -> Result<Self, Self::Error> {
        let family = body
            .family
            .ok_or_else(|| ApiError::validation_error("family is required"))?;
        let birthday = body
            .birthday
            .ok_or_else(|| ApiError::validation_error("birthday is required"))?;

        Ok(CreatePetInput {
            family,
            name: body.name,
            birthday,
            gender: body.gender,
            breed: body.breed,
            shelter_id: body.shelter,
            taken_home: body.taken_home,
            counters: EngagementCounters {
                in_favorites: body.in_favorites,
                take_a_home: body.take_a_home,
                take_a_walk: body.take_a_walk,
                visit_counter: body.visit_counter,
            },
        })
    }
}

impl From<UpdatePetRequest> for UpdatePetInput {
    fn from(body: UpdatePetRequest) -> Self {
        Self {
            family: body.family,
            name: body.name,
            birthday: body.birthday,
            gender: body.gender,
            breed: body.breed,
            shelter_id: body.shelter,
            taken_home: body.taken_home,
            in_favorites: body.in_favorites,
            take_a_walk: body.take_a_walk,
            take_a_home: body.take_a_home,
            visit_counter: body.visit_counter,
        }
    }
}

impl From<PetServiceError> for ApiError {
    fn from(error: PetServiceError) -> Self {
        match error {
            PetServiceError::NotFound(id) => ApiError::not_found(format!("Pet not found: {}", id)),
            PetServiceError::TownNotFound(slug) => {
                ApiError::not_found(format!("Town not found: {}", slug))
            }
            PetServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            PetServiceError::InternalError(e) => ApiError::internal(format!("{:#}", e)),
        }
    }
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pets))
        .route("/favorite", get(favorite_pets))
        .route("/{id}", get(get_pet))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_pet))
        .route("/{id}", patch(update_pet).delete(delete_pet))
}

/// GET /api/v1/pets
async fn list_pets(
    State(state): State<AppState>,
    Query(filter): Query<PetFilter>,
) -> Result<Json<Vec<PetResponse>>, ApiError> {
    let pets = state.pet_service.list(&filter).await?;
    Ok(Json(pets.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/pets/favorite?town=<slug>
async fn favorite_pets(
    State(state): State<AppState>,
    Query(query): Query<FavoriteQuery>,
) -> Result<Json<Vec<PetResponse>>, ApiError> {
    let town = query
        .town
        .ok_or_else(|| ApiError::validation_error("town query parameter is required"))?;
    let pets = state.pet_service.favorites_in_town(&town).await?;
    Ok(Json(pets.into_iter().map(Into::into).collect()))
}

async fn get_pet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PetResponse>, ApiError> {
    Ok(Json(state.pet_service.get(id).await?.into()))
}

async fn create_pet(
    State(state): State<AppState>,
    Json(body): Json<CreatePetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let pet = state.pet_service.create(body.try_into()?).await?;
    Ok((StatusCode::CREATED, Json(PetResponse::from(pet))))
}

async fn update_pet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePetRequest>,
) -> Result<Json<PetResponse>, ApiError> {
    Ok(Json(state.pet_service.update(id, body.into()).await?.into()))
}

async fn delete_pet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.pet_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
