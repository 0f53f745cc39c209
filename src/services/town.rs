//! Town service
//!
//! Towns refer to their country by slug on input and are returned joined
//! with the full country record.

use crate::db::repositories::{CountryRepository, TownRepository};
use crate::models::{Country, CreateTownInput, Town, TownWithCountry, UpdateTownInput};
use crate::services::slug::{check_slug, resolve_slug};
use crate::services::validation::{clean_name, matches_search};
use anyhow::Context;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum TownServiceError {
    #[error("Town not found: {0}")]
    NotFound(String),

    #[error("Town slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct TownService {
    repo: Arc<dyn TownRepository>,
    country_repo: Arc<dyn CountryRepository>,
}

impl TownService {
    pub fn new(repo: Arc<dyn TownRepository>, country_repo: Arc<dyn CountryRepository>) -> Self {
        Self { repo, country_repo }
    }

    pub async fn list(&self, search: Option<&str>) -> Result<Vec<TownWithCountry>, TownServiceError> {
        let towns = self.repo.list().await.context("Failed to list towns")?;
        let countries: HashMap<i64, Country> = self
            .country_repo
            .list()
            .await
            .context("Failed to list countries")?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        Ok(towns
            .into_iter()
            .filter(|t| matches_search(&t.name, search))
            .map(|town| {
                let country = town.country_id.and_then(|id| countries.get(&id).cloned());
                TownWithCountry { town, country }
            })
            .collect())
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<TownWithCountry, TownServiceError> {
        let town = self.find(slug).await?;
        self.with_country(town).await
    }

    pub async fn create(&self, input: CreateTownInput) -> Result<TownWithCountry, TownServiceError> {
        let name = clean_name(&input.name).map_err(TownServiceError::ValidationError)?;
        let slug = resolve_slug(input.slug.as_deref(), &name)
            .map_err(|e| TownServiceError::ValidationError(e.to_string()))?;
        let country_id = match input.country.as_deref() {
            Some(country_slug) => Some(self.country_id(country_slug).await?),
            None => None,
        };
        self.ensure_slug_free(&slug).await?;

        let created = self
            .repo
            .create(&Town::new(name, slug, country_id))
            .await
            .context("Failed to create town")?;
        tracing::info!("Created town {}", created.slug);
        self.with_country(created).await
    }

    pub async fn update(&self, slug: &str, input: UpdateTownInput) -> Result<TownWithCountry, TownServiceError> {
        let mut town = self.find(slug).await?;

        if let Some(name) = input.name {
            town.name = clean_name(&name).map_err(TownServiceError::ValidationError)?;
        }
        if let Some(country) = input.country {
            town.country_id = match country.as_deref() {
                Some(country_slug) => Some(self.country_id(country_slug).await?),
                None => None,
            };
        }
        if let Some(new_slug) = input.slug {
            let new_slug =
                check_slug(&new_slug).map_err(|e| TownServiceError::ValidationError(e.to_string()))?;
            if new_slug != town.slug {
                self.ensure_slug_free(&new_slug).await?;
                town.slug = new_slug;
            }
        }

        let updated = self.repo.update(&town).await.context("Failed to update town")?;
        self.with_country(updated).await
    }

    /// Delete a town; its shelters are kept without a town.
    pub async fn delete(&self, slug: &str) -> Result<(), TownServiceError> {
        let town = self.find(slug).await?;
        self.repo.delete(town.id).await.context("Failed to delete town")?;
        tracing::info!("Deleted town {}", town.slug);
        Ok(())
    }

    async fn find(&self, slug: &str) -> Result<Town, TownServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get town")?
            .ok_or_else(|| TownServiceError::NotFound(slug.to_string()))
    }

    async fn with_country(&self, town: Town) -> Result<TownWithCountry, TownServiceError> {
        let country = match town.country_id {
            Some(id) => self
                .country_repo
                .get_by_id(id)
                .await
                .context("Failed to get town country")?,
            None => None,
        };
        Ok(TownWithCountry { town, country })
    }

    /// A referenced country that does not exist is an input error
    async fn country_id(&self, country_slug: &str) -> Result<i64, TownServiceError> {
        self.country_repo
            .get_by_slug(country_slug)
            .await
            .context("Failed to get country")?
            .map(|c| c.id)
            .ok_or_else(|| {
                TownServiceError::ValidationError(format!(
                    "Country with slug '{}' does not exist",
                    country_slug
                ))
            })
    }

    async fn ensure_slug_free(&self, slug: &str) -> Result<(), TownServiceError> {
        if self.repo.exists_by_slug(slug).await.context("Failed to check town slug")? {
            return Err(TownServiceError::DuplicateSlug(slug.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxCountryRepository, SqlxTownRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service() -> (TownService, Arc<dyn CountryRepository>) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let countries = SqlxCountryRepository::boxed(pool.clone());
        countries
            .create(&Country::new("Russia".to_string(), "russia".to_string()))
            .await
            .unwrap();
        (
            TownService::new(SqlxTownRepository::boxed(pool), countries.clone()),
            countries,
        )
    }

    fn input(name: &str, country: Option<&str>) -> CreateTownInput {
        CreateTownInput {
            name: name.to_string(),
            slug: None,
            country: country.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_nests_country() {
        let (service, _) = setup_test_service().await;

        let kazan = service.create(input("Kazan", Some("russia"))).await.unwrap();
        assert_eq!(kazan.town.slug, "kazan");
        assert_eq!(kazan.country.unwrap().slug, "russia");

        let nowhere = service.create(input("Nowhere", None)).await.unwrap();
        assert!(nowhere.country.is_none());
    }

    #[tokio::test]
    async fn test_unknown_country_is_validation_error() {
        let (service, _) = setup_test_service().await;

        let result = service.create(input("Paris", Some("france"))).await;
        assert!(matches!(result, Err(TownServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_list_with_search() {
        let (service, _) = setup_test_service().await;
        service.create(input("Omsk", Some("russia"))).await.unwrap();
        service.create(input("Tomsk", Some("russia"))).await.unwrap();
        service.create(input("Kazan", Some("russia"))).await.unwrap();

        let found: Vec<String> = service
            .list(Some("OMSK"))
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.town.name)
            .collect();
        assert_eq!(found, vec!["Omsk", "Tomsk"]);
        assert!(service.list(None).await.unwrap().iter().all(|t| t.country.is_some()));
    }

    #[tokio::test]
    async fn test_update_detaches_country() {
        let (service, _) = setup_test_service().await;
        service.create(input("Kazan", Some("russia"))).await.unwrap();

        let updated = service
            .update(
                "kazan",
                UpdateTownInput {
                    country: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.country.is_none());
        assert_eq!(updated.town.country_id, None);
    }

    #[tokio::test]
    async fn test_deleting_country_keeps_town() {
        let (service, countries) = setup_test_service().await;
        service.create(input("Kazan", Some("russia"))).await.unwrap();

        let russia = countries.get_by_slug("russia").await.unwrap().unwrap();
        countries.delete(russia.id).await.unwrap();

        let kazan = service.get_by_slug("kazan").await.unwrap();
        assert!(kazan.country.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_and_missing() {
        let (service, _) = setup_test_service().await;
        service.create(input("Kazan", None)).await.unwrap();

        assert!(matches!(
            service.create(input("Kazan", None)).await,
            Err(TownServiceError::DuplicateSlug(_))
        ));
        assert!(matches!(
            service.delete("omsk").await,
            Err(TownServiceError::NotFound(_))
        ));
    }
}
