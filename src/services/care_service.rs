//! Catalog of care services donations can pay for

use crate::db::repositories::CareServiceRepository;
use crate::models::{CareService, CreateCareServiceInput, UpdateCareServiceInput};
use crate::services::slug::{check_slug, resolve_slug};
use crate::services::validation::clean_name;
use anyhow::Context;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum CareServiceError {
    #[error("Service not found: {0}")]
    NotFound(String),

    #[error("Service slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct CareServiceCatalog {
    repo: Arc<dyn CareServiceRepository>,
}

impl CareServiceCatalog {
    pub fn new(repo: Arc<dyn CareServiceRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<CareService>, CareServiceError> {
        Ok(self.repo.list().await.context("Failed to list services")?)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<CareService, CareServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get service")?
            .ok_or_else(|| CareServiceError::NotFound(slug.to_string()))
    }

    pub async fn create(&self, input: CreateCareServiceInput) -> Result<CareService, CareServiceError> {
        let name = clean_name(&input.name).map_err(CareServiceError::ValidationError)?;
        let slug = resolve_slug(input.slug.as_deref(), &name)
            .map_err(|e| CareServiceError::ValidationError(e.to_string()))?;
        self.ensure_slug_free(&slug).await?;

        let created = self
            .repo
            .create(&CareService::new(name, slug))
            .await
            .context("Failed to create service")?;
        Ok(created)
    }

    pub async fn update(&self, slug: &str, input: UpdateCareServiceInput) -> Result<CareService, CareServiceError> {
        let mut service = self.get_by_slug(slug).await?;

        if let Some(name) = input.name {
            service.name = clean_name(&name).map_err(CareServiceError::ValidationError)?;
        }
        if let Some(new_slug) = input.slug {
            let new_slug =
                check_slug(&new_slug).map_err(|e| CareServiceError::ValidationError(e.to_string()))?;
            if new_slug != service.slug {
                self.ensure_slug_free(&new_slug).await?;
                service.slug = new_slug;
            }
        }

        Ok(self.repo.update(&service).await.context("Failed to update service")?)
    }

    pub async fn delete(&self, slug: &str) -> Result<(), CareServiceError> {
        let service = self.get_by_slug(slug).await?;
        self.repo.delete(service.id).await.context("Failed to delete service")?;
        Ok(())
    }

    async fn ensure_slug_free(&self, slug: &str) -> Result<(), CareServiceError> {
        if self.repo.exists_by_slug(slug).await.context("Failed to check service slug")? {
            return Err(CareServiceError::DuplicateSlug(slug.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxCareServiceRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service() -> CareServiceCatalog {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        CareServiceCatalog::new(SqlxCareServiceRepository::boxed(pool))
    }

    #[tokio::test]
    async fn test_service_lifecycle() {
        let catalog = setup_test_service().await;

        let created = catalog
            .create(CreateCareServiceInput {
                name: "Корм".to_string(),
                slug: None,
            })
            .await
            .unwrap();
        assert_eq!(created.slug, "korm");

        let renamed = catalog
            .update(
                "korm",
                UpdateCareServiceInput {
                    slug: Some("food".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Корм");
        assert_eq!(catalog.get_by_slug("food").await.unwrap().id, created.id);

        catalog.delete("food").await.unwrap();
        assert!(catalog.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_slug() {
        let catalog = setup_test_service().await;
        let input = CreateCareServiceInput {
            name: "Vet".to_string(),
            slug: None,
        };
        catalog.create(input.clone()).await.unwrap();
        assert!(matches!(
            catalog.create(input).await,
            Err(CareServiceError::DuplicateSlug(_))
        ));
    }
}
