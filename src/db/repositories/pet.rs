//! Pet repository
//!
//! Listings join each pet with the town and country of its shelter so the
//! catalog can be filtered by location slug. Engagement counters are stored
//! as nullable integers; NULL means the counter was never recorded.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Gender, Pet, PetFamily, PetListing};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

#[async_trait]
pub trait PetRepository: Send + Sync {
    async fn create(&self, pet: &Pet) -> Result<Pet>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Pet>>;

    async fn get_listing(&self, id: i64) -> Result<Option<PetListing>>;

    /// Every pet with its location slugs, in catalog order
    async fn list_listings(&self) -> Result<Vec<PetListing>>;

    async fn update(&self, pet: &Pet) -> Result<Pet>;

    /// Delete a pet; donations made for it stay and lose the link
    async fn delete(&self, id: i64) -> Result<()>;
}

pub struct SqlxPetRepository {
    pool: DynDatabasePool,
}

impl SqlxPetRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PetRepository> {
        Arc::new(Self::new(pool))
    }
}

const PET_COLUMNS: &str = "p.id, p.family, p.name, p.birthday, p.pub_date, p.gender, p.breed, \
     p.shelter_id, p.taken_home, p.in_favorites, p.take_a_walk, p.take_a_home, p.visit_counter";

const LISTING_JOINS: &str = "FROM pets p \
     LEFT JOIN shelters s ON s.id = p.shelter_id \
     LEFT JOIN towns t ON t.id = s.town_id \
     LEFT JOIN countries c ON c.id = t.country_id";

const INSERT_PET: &str = r#"
    INSERT INTO pets (family, name, birthday, pub_date, gender, breed, shelter_id, taken_home,
                      in_favorites, take_a_walk, take_a_home, visit_counter)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_PET: &str = r#"
    UPDATE pets
    SET family = ?, name = ?, birthday = ?, gender = ?, breed = ?, shelter_id = ?,
        taken_home = ?, in_favorites = ?, take_a_walk = ?, take_a_home = ?, visit_counter = ?
    WHERE id = ?
"#;

#[async_trait]
impl PetRepository for SqlxPetRepository {
    async fn create(&self, pet: &Pet) -> Result<Pet> {
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(INSERT_PET)
                .bind(pet.family.as_str())
                .bind(&pet.name)
                .bind(pet.birthday)
                .bind(pet.pub_date)
                .bind(pet.gender.as_str())
                .bind(&pet.breed)
                .bind(pet.shelter_id)
                .bind(pet.taken_home)
                .bind(pet.in_favorites.map(i64::from))
                .bind(pet.take_a_walk.map(i64::from))
                .bind(pet.take_a_home.map(i64::from))
                .bind(pet.visit_counter.map(i64::from))
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create pet")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(INSERT_PET)
                .bind(pet.family.as_str())
                .bind(&pet.name)
                .bind(pet.birthday)
                .bind(pet.pub_date)
                .bind(pet.gender.as_str())
                .bind(&pet.breed)
                .bind(pet.shelter_id)
                .bind(pet.taken_home)
                .bind(pet.in_favorites.map(i64::from))
                .bind(pet.take_a_walk.map(i64::from))
                .bind(pet.take_a_home.map(i64::from))
                .bind(pet.visit_counter.map(i64::from))
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create pet")?
                .last_insert_id() as i64,
        };
        Ok(Pet { id, ..pet.clone() })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Pet>> {
        let sql = format!("SELECT {} FROM pets p WHERE p.id = ?", PET_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql).bind(id).fetch_optional(self.pool.sqlite()?).await
                    .context("Failed to get pet by ID")?;
                row.as_ref().map(row_to_pet_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql).bind(id).fetch_optional(self.pool.mysql()?).await
                    .context("Failed to get pet by ID")?;
                row.as_ref().map(row_to_pet_mysql).transpose()
            }
        }
    }

    async fn get_listing(&self, id: i64) -> Result<Option<PetListing>> {
        let sql = format!(
            "SELECT {}, t.slug AS town_slug, c.slug AS country_slug {} WHERE p.id = ?",
            PET_COLUMNS, LISTING_JOINS
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql).bind(id).fetch_optional(self.pool.sqlite()?).await
                    .context("Failed to get pet listing")?;
                row.as_ref().map(row_to_listing_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql).bind(id).fetch_optional(self.pool.mysql()?).await
                    .context("Failed to get pet listing")?;
                row.as_ref().map(row_to_listing_mysql).transpose()
            }
        }
    }

    async fn list_listings(&self) -> Result<Vec<PetListing>> {
        // NULL sorts first on both backends, matching the in-memory order
        let sql = format!(
            "SELECT {}, t.slug AS town_slug, c.slug AS country_slug {} ORDER BY p.in_favorites, p.id",
            PET_COLUMNS, LISTING_JOINS
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql).fetch_all(self.pool.sqlite()?).await
                    .context("Failed to list pets")?;
                rows.iter().map(row_to_listing_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql).fetch_all(self.pool.mysql()?).await
                    .context("Failed to list pets")?;
                rows.iter().map(row_to_listing_mysql).collect()
            }
        }
    }

    async fn update(&self, pet: &Pet) -> Result<Pet> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(UPDATE_PET)
                    .bind(pet.family.as_str())
                    .bind(&pet.name)
                    .bind(pet.birthday)
                    .bind(pet.gender.as_str())
                    .bind(&pet.breed)
                    .bind(pet.shelter_id)
                    .bind(pet.taken_home)
                    .bind(pet.in_favorites.map(i64::from))
                    .bind(pet.take_a_walk.map(i64::from))
                    .bind(pet.take_a_home.map(i64::from))
                    .bind(pet.visit_counter.map(i64::from))
                    .bind(pet.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update pet")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(UPDATE_PET)
                    .bind(pet.family.as_str())
                    .bind(&pet.name)
                    .bind(pet.birthday)
                    .bind(pet.gender.as_str())
                    .bind(&pet.breed)
                    .bind(pet.shelter_id)
                    .bind(pet.taken_home)
                    .bind(pet.in_favorites.map(i64::from))
                    .bind(pet.take_a_walk.map(i64::from))
                    .bind(pet.take_a_home.map(i64::from))
                    .bind(pet.visit_counter.map(i64::from))
                    .bind(pet.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update pet")?;
            }
        }
        Ok(pet.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_pet_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_pet_mysql(self.pool.mysql()?, id).await,
        }
    }
}

/// Decode a stored counter, rejecting values outside `u32`
fn decode_counter(value: Option<i64>, column: &str) -> Result<Option<u32>> {
    value
        .map(u32::try_from)
        .transpose()
        .with_context(|| format!("Counter {} out of range", column))
}

fn parse_family(value: &str) -> Result<PetFamily> {
    PetFamily::from_str(value).with_context(|| format!("Invalid family in database: {}", value))
}

fn parse_gender(value: &str) -> Result<Gender> {
    Gender::from_str(value).with_context(|| format!("Invalid gender in database: {}", value))
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn delete_pet_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    sqlx::query("UPDATE transactions SET pet_id = NULL WHERE pet_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to detach transactions from pet")?;
    sqlx::query("DELETE FROM pets WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete pet")?;
    tx.commit().await.context("Failed to commit pet deletion")?;
    Ok(())
}

fn row_to_pet_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Pet> {
    let family: String = row.try_get("family")?;
    let gender: String = row.try_get("gender")?;

    Ok(Pet {
        id: row.try_get("id")?,
        family: parse_family(&family)?,
        name: row.try_get("name")?,
        birthday: row.try_get("birthday")?,
        pub_date: row.try_get("pub_date")?,
        gender: parse_gender(&gender)?,
        breed: row.try_get("breed")?,
        shelter_id: row.try_get("shelter_id")?,
        taken_home: row.try_get("taken_home")?,
        in_favorites: decode_counter(row.try_get("in_favorites")?, "in_favorites")?,
        take_a_walk: decode_counter(row.try_get("take_a_walk")?, "take_a_walk")?,
        take_a_home: decode_counter(row.try_get("take_a_home")?, "take_a_home")?,
        visit_counter: decode_counter(row.try_get("visit_counter")?, "visit_counter")?,
    })
}

fn row_to_listing_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<PetListing> {
    Ok(PetListing {
        pet: row_to_pet_sqlite(row)?,
        town_slug: row.try_get("town_slug")?,
        country_slug: row.try_get("country_slug")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn delete_pet_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    sqlx::query("UPDATE transactions SET pet_id = NULL WHERE pet_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to detach transactions from pet")?;
    sqlx::query("DELETE FROM pets WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete pet")?;
    tx.commit().await.context("Failed to commit pet deletion")?;
    Ok(())
}

fn row_to_pet_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Pet> {
    let family: String = row.try_get("family")?;
    let gender: String = row.try_get("gender")?;

    Ok(Pet {
        id: row.try_get("id")?,
        family: parse_family(&family)?,
        name: row.try_get("name")?,
        birthday: row.try_get("birthday")?,
        pub_date: row.try_get("pub_date")?,
        gender: parse_gender(&gender)?,
        breed: row.try_get("breed")?,
        shelter_id: row.try_get("shelter_id")?,
        taken_home: row.try_get("taken_home")?,
        in_favorites: decode_counter(row.try_get("in_favorites")?, "in_favorites")?,
        take_a_walk: decode_counter(row.try_get("take_a_walk")?, "take_a_walk")?,
        take_a_home: decode_counter(row.try_get("take_a_home")?, "take_a_home")?,
        visit_counter: decode_counter(row.try_get("visit_counter")?, "visit_counter")?,
    })
}

fn row_to_listing_mysql(row: &sqlx::mysql::MySqlRow) -> Result<PetListing> {
    Ok(PetListing {
        pet: row_to_pet_mysql(row)?,
        town_slug: row.try_get("town_slug")?,
        country_slug: row.try_get("country_slug")?,
    })
}
