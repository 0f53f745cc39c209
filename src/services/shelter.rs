//! Shelter service

use crate::db::repositories::{ShelterRepository, TownRepository};
use crate::models::{CreateShelterInput, Shelter, UpdateShelterInput};
use crate::services::slug::{check_slug, resolve_slug};
use crate::services::validation::clean_name;
use anyhow::Context;
use std::sync::Arc;

pub const ADDRESS_MAX_CHARS: usize = 300;

#[derive(Debug, thiserror::Error)]
pub enum ShelterServiceError {
    #[error("Shelter not found: {0}")]
    NotFound(String),

    #[error("Shelter slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct ShelterService {
    repo: Arc<dyn ShelterRepository>,
    town_repo: Arc<dyn TownRepository>,
}

impl ShelterService {
    pub fn new(repo: Arc<dyn ShelterRepository>, town_repo: Arc<dyn TownRepository>) -> Self {
        Self { repo, town_repo }
    }

    pub async fn list(&self) -> Result<Vec<Shelter>, ShelterServiceError> {
        Ok(self.repo.list().await.context("Failed to list shelters")?)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Shelter, ShelterServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get shelter")?
            .ok_or_else(|| ShelterServiceError::NotFound(slug.to_string()))
    }

    pub async fn create(&self, input: CreateShelterInput) -> Result<Shelter, ShelterServiceError> {
        let name = clean_name(&input.name).map_err(ShelterServiceError::ValidationError)?;
        let slug = resolve_slug(input.slug.as_deref(), &name)
            .map_err(|e| ShelterServiceError::ValidationError(e.to_string()))?;
        let address = clean_address(&input.address)?;
        self.check_town(input.town_id).await?;
        self.ensure_slug_free(&slug).await?;

        let created = self
            .repo
            .create(&Shelter::new(name, slug, address, input.town_id))
            .await
            .context("Failed to create shelter")?;
        tracing::info!("Created shelter {}", created.slug);
        Ok(created)
    }

    pub async fn update(&self, slug: &str, input: UpdateShelterInput) -> Result<Shelter, ShelterServiceError> {
        let mut shelter = self.get_by_slug(slug).await?;

        if let Some(name) = input.name {
            shelter.name = clean_name(&name).map_err(ShelterServiceError::ValidationError)?;
        }
        if let Some(address) = input.address {
            shelter.address = clean_address(&address)?;
        }
        if let Some(town_id) = input.town_id {
            self.check_town(town_id).await?;
            shelter.town_id = town_id;
        }
        if let Some(new_slug) = input.slug {
            let new_slug =
                check_slug(&new_slug).map_err(|e| ShelterServiceError::ValidationError(e.to_string()))?;
            if new_slug != shelter.slug {
                self.ensure_slug_free(&new_slug).await?;
                shelter.slug = new_slug;
            }
        }

        let updated = self.repo.update(&shelter).await.context("Failed to update shelter")?;
        Ok(updated)
    }

    /// Delete a shelter; its pets are kept without a shelter.
    pub async fn delete(&self, slug: &str) -> Result<(), ShelterServiceError> {
        let shelter = self.get_by_slug(slug).await?;
        self.repo.delete(shelter.id).await.context("Failed to delete shelter")?;
        tracing::info!("Deleted shelter {}", shelter.slug);
        Ok(())
    }

    async fn check_town(&self, town_id: Option<i64>) -> Result<(), ShelterServiceError> {
        let Some(town_id) = town_id else {
            return Ok(());
        };
        if self
            .town_repo
            .get_by_id(town_id)
            .await
            .context("Failed to get town")?
            .is_none()
        {
            return Err(ShelterServiceError::ValidationError(format!(
                "Town {} does not exist",
                town_id
            )));
        }
        Ok(())
    }

    async fn ensure_slug_free(&self, slug: &str) -> Result<(), ShelterServiceError> {
        if self.repo.exists_by_slug(slug).await.context("Failed to check shelter slug")? {
            return Err(ShelterServiceError::DuplicateSlug(slug.to_string()));
        }
        Ok(())
    }
}

fn clean_address(address: &str) -> Result<String, ShelterServiceError> {
    let address = address.trim();
    if address.chars().count() > ADDRESS_MAX_CHARS {
        return Err(ShelterServiceError::ValidationError(format!(
            "Address cannot exceed {} characters",
            ADDRESS_MAX_CHARS
        )));
    }
    Ok(address.to_string())
}
