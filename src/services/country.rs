//! Country service

use crate::db::repositories::CountryRepository;
use crate::models::{Country, CreateCountryInput, UpdateCountryInput};
use crate::services::slug::{check_slug, resolve_slug};
use crate::services::validation::{clean_name, matches_search};
use anyhow::Context;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum CountryServiceError {
    #[error("Country not found: {0}")]
    NotFound(String),

    #[error("Country slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct CountryService {
    repo: Arc<dyn CountryRepository>,
}

impl CountryService {
    pub fn new(repo: Arc<dyn CountryRepository>) -> Self {
        Self { repo }
    }

    /// Countries ordered by name, optionally narrowed by a name search
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Country>, CountryServiceError> {
        let countries = self.repo.list().await.context("Failed to list countries")?;
        Ok(countries
            .into_iter()
            .filter(|c| matches_search(&c.name, search))
            .collect())
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Country, CountryServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get country")?
            .ok_or_else(|| CountryServiceError::NotFound(slug.to_string()))
    }

    pub async fn create(&self, input: CreateCountryInput) -> Result<Country, CountryServiceError> {
        let name = clean_name(&input.name).map_err(CountryServiceError::ValidationError)?;
        let slug = resolve_slug(input.slug.as_deref(), &name)
            .map_err(|e| CountryServiceError::ValidationError(e.to_string()))?;
        self.ensure_slug_free(&slug).await?;

        let created = self
            .repo
            .create(&Country::new(name, slug))
            .await
            .context("Failed to create country")?;
        tracing::info!("Created country {}", created.slug);
        Ok(created)
    }

    pub async fn update(&self, slug: &str, input: UpdateCountryInput) -> Result<Country, CountryServiceError> {
        let mut country = self.get_by_slug(slug).await?;

        if let Some(name) = input.name {
            country.name = clean_name(&name).map_err(CountryServiceError::ValidationError)?;
        }
        if let Some(new_slug) = input.slug {
            let new_slug =
                check_slug(&new_slug).map_err(|e| CountryServiceError::ValidationError(e.to_string()))?;
            if new_slug != country.slug {
                self.ensure_slug_free(&new_slug).await?;
                country.slug = new_slug;
            }
        }

        let updated = self.repo.update(&country).await.context("Failed to update country")?;
        Ok(updated)
    }

    /// Delete a country; its towns are kept without a country.
    pub async fn delete(&self, slug: &str) -> Result<(), CountryServiceError> {
        let country = self.get_by_slug(slug).await?;
        self.repo.delete(country.id).await.context("Failed to delete country")?;
        tracing::info!("Deleted country {}", country.slug);
        Ok(())
    }

    async fn ensure_slug_free(&self, slug: &str) -> Result<(), CountryServiceError> {
        if self
            .repo
            .exists_by_slug(slug)
            .await
            .context("Failed to check country slug")?
        {
            return Err(CountryServiceError::DuplicateSlug(slug.to_string()));
        }
        Ok(())
    }
}
