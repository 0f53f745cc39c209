//! Pet service
//!
//! Listings always come back in catalog order (ascending by the raw
//! favorites counter) and are narrowed with a [`PetFilter`].

use crate::catalog::{sort_catalog, PetFilter};
use crate::db::repositories::{PetRepository, ShelterRepository, TownRepository};
use crate::models::{CreatePetInput, Pet, PetListing, UpdatePetInput, DEFAULT_BREED};
use crate::services::validation::clean_name;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// How many pets the per-town favorites listing returns
pub const FAVORITES_LIMIT: usize = 10;
pub const BREED_MAX_CHARS: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum PetServiceError {
    #[error("Pet not found: {0}")]
    NotFound(i64),

    #[error("Town not found: {0}")]
    TownNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct PetService {
    repo: Arc<dyn PetRepository>,
    shelter_repo: Arc<dyn ShelterRepository>,
    town_repo: Arc<dyn TownRepository>,
}

impl PetService {
    pub fn new(
        repo: Arc<dyn PetRepository>,
        shelter_repo: Arc<dyn ShelterRepository>,
        town_repo: Arc<dyn TownRepository>,
    ) -> Self {
        Self {
            repo,
            shelter_repo,
            town_repo,
        }
    }

    /// The catalog, in default order, narrowed by `filter`.
    pub async fn list(&self, filter: &PetFilter) -> Result<Vec<PetListing>, PetServiceError> {
        let mut listings = self.repo.list_listings().await.context("Failed to list pets")?;
        sort_catalog(&mut listings);
        Ok(filter.apply(listings))
    }

    pub async fn get(&self, id: i64) -> Result<PetListing, PetServiceError> {
        self.repo
            .get_listing(id)
            .await
            .context("Failed to get pet")?
            .ok_or(PetServiceError::NotFound(id))
    }

    /// The first [`FAVORITES_LIMIT`] pets, in catalog order, housed in
    /// shelters of the town with this exact slug.
    pub async fn favorites_in_town(&self, town_slug: &str) -> Result<Vec<PetListing>, PetServiceError> {
        if self
            .town_repo
            .get_by_slug(town_slug)
            .await
            .context("Failed to get town")?
            .is_none()
        {
            return Err(PetServiceError::TownNotFound(town_slug.to_string()));
        }

        let mut listings = self.repo.list_listings().await.context("Failed to list pets")?;
        sort_catalog(&mut listings);
        Ok(listings
            .into_iter()
            .filter(|l| l.town_slug.as_deref() == Some(town_slug))
            .take(FAVORITES_LIMIT)
            .collect())
    }

    pub async fn create(&self, input: CreatePetInput) -> Result<PetListing, PetServiceError> {
        let name = clean_name(&input.name).map_err(PetServiceError::ValidationError)?;
        let breed = clean_breed(input.breed.as_deref())?;
        self.check_shelter(input.shelter_id).await?;

        let pet = Pet {
            id: 0,
            family: input.family,
            name,
            birthday: input.birthday,
            pub_date: Utc::now(),
            gender: input.gender.unwrap_or_default(),
            breed,
            shelter_id: input.shelter_id,
            taken_home: input.taken_home,
            in_favorites: input.counters.in_favorites,
            take_a_walk: input.counters.take_a_walk,
            take_a_home: input.counters.take_a_home,
            visit_counter: input.counters.visit_counter,
        };

        let created = self.repo.create(&pet).await.context("Failed to create pet")?;
        tracing::info!("Created pet {} ({})", created.name, created.id);
        self.get(created.id).await
    }

    /// Apply a partial update. `pub_date` never changes.
    pub async fn update(&self, id: i64, input: UpdatePetInput) -> Result<PetListing, PetServiceError> {
        let mut pet = self.get(id).await?.pet;

        if let Some(family) = input.family {
            pet.family = family;
        }
        if let Some(name) = input.name {
            pet.name = clean_name(&name).map_err(PetServiceError::ValidationError)?;
        }
        if let Some(birthday) = input.birthday {
            pet.birthday = birthday;
        }
        if let Some(gender) = input.gender {
            pet.gender = gender;
        }
        if let Some(breed) = input.breed {
            pet.breed = clean_breed(Some(&breed))?;
        }
        if let Some(shelter_id) = input.shelter_id {
            self.check_shelter(shelter_id).await?;
            pet.shelter_id = shelter_id;
        }
        if let Some(taken_home) = input.taken_home {
            pet.taken_home = taken_home;
        }
        if let Some(value) = input.in_favorites {
            pet.in_favorites = value;
        }
        if let Some(value) = input.take_a_walk {
            pet.take_a_walk = value;
        }
        if let Some(value) = input.take_a_home {
            pet.take_a_home = value;
        }
        if let Some(value) = input.visit_counter {
            pet.visit_counter = value;
        }

        self.repo.update(&pet).await.context("Failed to update pet")?;
        self.get(id).await
    }

    /// Delete a pet; donations made for it are kept.
    pub async fn delete(&self, id: i64) -> Result<(), PetServiceError> {
        let listing = self.get(id).await?;
        self.repo.delete(id).await.context("Failed to delete pet")?;
        tracing::info!("Deleted pet {} ({})", listing.pet.name, id);
        Ok(())
    }

    async fn check_shelter(&self, shelter_id: Option<i64>) -> Result<(), PetServiceError> {
        let Some(shelter_id) = shelter_id else {
            return Ok(());
        };
        if self
            .shelter_repo
            .get_by_id(shelter_id)
            .await
            .context("Failed to get shelter")?
            .is_none()
        {
            return Err(PetServiceError::ValidationError(format!(
                "Shelter {} does not exist",
                shelter_id
            )));
        }
        Ok(())
    }
}

fn clean_breed(breed: Option<&str>) -> Result<String, PetServiceError> {
    let breed = breed.map(str::trim).filter(|b| !b.is_empty()).unwrap_or(DEFAULT_BREED);
    if breed.chars().count() > BREED_MAX_CHARS {
        return Err(PetServiceError::ValidationError(format!(
            "Breed cannot exceed {} characters",
            BREED_MAX_CHARS
        )));
    }
    Ok(breed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EngagementCounters;
    use crate::db::repositories::{
        CountryRepository, SqlxCountryRepository, SqlxPetRepository, SqlxShelterRepository,
        SqlxTownRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Country, Gender, PetFamily, Shelter, Town};
    use chrono::{TimeZone, Utc};

    struct Fixture {
        service: PetService,
        kazan_shelter: i64,
        omsk_shelter: i64,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let countries = SqlxCountryRepository::boxed(pool.clone());
        let towns = SqlxTownRepository::boxed(pool.clone());
        let shelters = SqlxShelterRepository::boxed(pool.clone());

        let russia = countries
            .create(&Country::new("Russia".to_string(), "russia".to_string()))
            .await
            .unwrap();
        let kazan = towns
            .create(&Town::new("Kazan".to_string(), "kazan".to_string(), Some(russia.id)))
            .await
            .unwrap();
        let omsk = towns
            .create(&Town::new("Omsk".to_string(), "omsk".to_string(), Some(russia.id)))
            .await
            .unwrap();
        let kazan_shelter = shelters
            .create(&Shelter::new("Paws".to_string(), "paws".to_string(), String::new(), Some(kazan.id)))
            .await
            .unwrap();
        let omsk_shelter = shelters
            .create(&Shelter::new("Tails".to_string(), "tails".to_string(), String::new(), Some(omsk.id)))
            .await
            .unwrap();

        Fixture {
            service: PetService::new(SqlxPetRepository::boxed(pool), shelters, towns),
            kazan_shelter: kazan_shelter.id,
            omsk_shelter: omsk_shelter.id,
        }
    }

    fn input(name: &str, family: PetFamily, shelter_id: Option<i64>, counters: EngagementCounters) -> CreatePetInput {
        CreatePetInput {
            family,
            name: name.to_string(),
            birthday: Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap(),
            gender: None,
            breed: None,
            shelter_id,
            taken_home: false,
            counters,
        }
    }

    fn favorites(count: u32) -> EngagementCounters {
        EngagementCounters {
            in_favorites: Some(count),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let f = setup().await;

        let rex = f
            .service
            .create(input("Rex", PetFamily::Dog, Some(f.kazan_shelter), EngagementCounters::default()))
            .await
            .unwrap();

        assert_eq!(rex.pet.breed, DEFAULT_BREED);
        assert_eq!(rex.pet.gender, Gender::Male);
        assert_eq!(rex.town_slug.as_deref(), Some("kazan"));
        assert!(rex.pet.rating().is_err());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let f = setup().await;

        assert!(matches!(
            f.service
                .create(input(" ", PetFamily::Cat, None, EngagementCounters::default()))
                .await,
            Err(PetServiceError::ValidationError(_))
        ));
        assert!(matches!(
            f.service
                .create(input("Rex", PetFamily::Dog, Some(404), EngagementCounters::default()))
                .await,
            Err(PetServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_list_orders_by_favorites_not_rating() {
        let f = setup().await;

        // Fewer favorites but the higher rating
        f.service
            .create(input("Walker", PetFamily::Dog, None, EngagementCounters::new(1, 100, 100, 100)))
            .await
            .unwrap();
        f.service
            .create(input("Cuddly", PetFamily::Cat, None, EngagementCounters::new(50, 0, 0, 0)))
            .await
            .unwrap();

        let listed = f.service.list(&PetFilter::default()).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|l| l.pet.name.as_str()).collect();
        assert_eq!(names, vec!["Walker", "Cuddly"]);
        assert!(listed[0].pet.rating().unwrap() > listed[1].pet.rating().unwrap());
    }

    #[tokio::test]
    async fn test_list_applies_filter() {
        let f = setup().await;
        f.service
            .create(input("Barsik", PetFamily::Cat, Some(f.kazan_shelter), favorites(1)))
            .await
            .unwrap();
        f.service
            .create(input("Sharik", PetFamily::Dog, Some(f.omsk_shelter), favorites(2)))
            .await
            .unwrap();
        f.service
            .create(input("Kaa", PetFamily::Snake, None, favorites(3)))
            .await
            .unwrap();

        let by_town = PetFilter {
            town: Some("kaz".to_string()),
            ..Default::default()
        };
        let names: Vec<String> = f
            .service
            .list(&by_town)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.pet.name)
            .collect();
        assert_eq!(names, vec!["Barsik"]);

        let by_country = PetFilter {
            country: Some("russia".to_string()),
            ..Default::default()
        };
        assert_eq!(f.service.list(&by_country).await.unwrap().len(), 2);

        let by_name = PetFilter {
            name: Some("arik".to_string()),
            ..Default::default()
        };
        assert_eq!(f.service.list(&by_name).await.unwrap()[0].pet.name, "Sharik");
    }

    #[tokio::test]
    async fn test_favorites_in_town() {
        let f = setup().await;
        for i in 0..12u32 {
            f.service
                .create(input(&format!("Cat {}", i), PetFamily::Cat, Some(f.kazan_shelter), favorites(100 - i)))
                .await
                .unwrap();
        }
        f.service
            .create(input("Omsk dog", PetFamily::Dog, Some(f.omsk_shelter), favorites(0)))
            .await
            .unwrap();

        let top = f.service.favorites_in_town("kazan").await.unwrap();
        assert_eq!(top.len(), FAVORITES_LIMIT);
        assert_eq!(top[0].pet.in_favorites, Some(89));
        assert!(top.iter().all(|l| l.town_slug.as_deref() == Some("kazan")));

        assert!(matches!(
            f.service.favorites_in_town("paris").await,
            Err(PetServiceError::TownNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_pub_date() {
        let f = setup().await;
        let created = f
            .service
            .create(input("Rex", PetFamily::Dog, Some(f.kazan_shelter), EngagementCounters::default()))
            .await
            .unwrap();

        let updated = f
            .service
            .update(
                created.pet.id,
                UpdatePetInput {
                    shelter_id: Some(None),
                    in_favorites: Some(Some(4)),
                    take_a_walk: Some(Some(4)),
                    take_a_home: Some(Some(4)),
                    visit_counter: Some(Some(4)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.pet.pub_date, created.pet.pub_date);
        assert_eq!(updated.pet.shelter_id, None);
        assert_eq!(updated.town_slug, None);
        assert_eq!(updated.pet.rating(), Ok(4));
    }

    #[tokio::test]
    async fn test_delete_pet() {
        let f = setup().await;
        let created = f
            .service
            .create(input("Rex", PetFamily::Dog, None, EngagementCounters::default()))
            .await
            .unwrap();

        f.service.delete(created.pet.id).await.unwrap();
        assert!(matches!(
            f.service.get(created.pet.id).await,
            Err(PetServiceError::NotFound(_))
        ));
    }
}
