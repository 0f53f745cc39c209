//! Shelter repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Shelter;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait ShelterRepository: Send + Sync {
    async fn create(&self, shelter: &Shelter) -> Result<Shelter>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Shelter>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Shelter>>;

    async fn list(&self) -> Result<Vec<Shelter>>;

    async fn update(&self, shelter: &Shelter) -> Result<Shelter>;

    /// Delete a shelter; its pets stay and lose their shelter
    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;
}

pub struct SqlxShelterRepository {
    pool: DynDatabasePool,
}

impl SqlxShelterRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ShelterRepository> {
        Arc::new(Self::new(pool))
    }
}

const SHELTER_COLUMNS: &str = "id, name, slug, address, town_id";

#[async_trait]
impl ShelterRepository for SqlxShelterRepository {
    async fn create(&self, shelter: &Shelter) -> Result<Shelter> {
        let sql = "INSERT INTO shelters (name, slug, address, town_id) VALUES (?, ?, ?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(&shelter.name)
                .bind(&shelter.slug)
                .bind(&shelter.address)
                .bind(shelter.town_id)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create shelter")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(&shelter.name)
                .bind(&shelter.slug)
                .bind(&shelter.address)
                .bind(shelter.town_id)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create shelter")?
                .last_insert_id() as i64,
        };
        Ok(Shelter {
            id,
            ..shelter.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Shelter>> {
        let sql = format!("SELECT {} FROM shelters WHERE id = ?", SHELTER_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql).bind(id).fetch_optional(self.pool.sqlite()?).await
                    .context("Failed to get shelter by ID")?;
                row.as_ref().map(row_to_shelter_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql).bind(id).fetch_optional(self.pool.mysql()?).await
                    .context("Failed to get shelter by ID")?;
                row.as_ref().map(row_to_shelter_mysql).transpose()
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Shelter>> {
        let sql = format!("SELECT {} FROM shelters WHERE slug = ?", SHELTER_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql).bind(slug).fetch_optional(self.pool.sqlite()?).await
                    .context("Failed to get shelter by slug")?;
                row.as_ref().map(row_to_shelter_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql).bind(slug).fetch_optional(self.pool.mysql()?).await
                    .context("Failed to get shelter by slug")?;
                row.as_ref().map(row_to_shelter_mysql).transpose()
            }
        }
    }

    async fn list(&self) -> Result<Vec<Shelter>> {
        let sql = format!("SELECT {} FROM shelters ORDER BY id", SHELTER_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql).fetch_all(self.pool.sqlite()?).await
                    .context("Failed to list shelters")?;
                rows.iter().map(row_to_shelter_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql).fetch_all(self.pool.mysql()?).await
                    .context("Failed to list shelters")?;
                rows.iter().map(row_to_shelter_mysql).collect()
            }
        }
    }

    async fn update(&self, shelter: &Shelter) -> Result<Shelter> {
        let sql = "UPDATE shelters SET name = ?, slug = ?, address = ?, town_id = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&shelter.name)
                    .bind(&shelter.slug)
                    .bind(&shelter.address)
                    .bind(shelter.town_id)
                    .bind(shelter.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update shelter")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&shelter.name)
                    .bind(&shelter.slug)
                    .bind(&shelter.address)
                    .bind(shelter.town_id)
                    .bind(shelter.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update shelter")?;
            }
        }
        Ok(shelter.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_shelter_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_shelter_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        Ok(self.get_by_slug(slug).await?.is_some())
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn delete_shelter_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    sqlx::query("UPDATE pets SET shelter_id = NULL WHERE shelter_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to detach pets from shelter")?;
    sqlx::query("DELETE FROM shelters WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete shelter")?;
    tx.commit().await.context("Failed to commit shelter deletion")?;
    Ok(())
}

fn row_to_shelter_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Shelter> {
    Ok(Shelter {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        address: row.try_get("address")?,
        town_id: row.try_get("town_id")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn delete_shelter_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    sqlx::query("UPDATE pets SET shelter_id = NULL WHERE shelter_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to detach pets from shelter")?;
    sqlx::query("DELETE FROM shelters WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete shelter")?;
    tx.commit().await.context("Failed to commit shelter deletion")?;
    Ok(())
}

fn row_to_shelter_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Shelter> {
    Ok(Shelter {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        address: row.try_get("address")?,
        town_id: row.try_get("town_id")?,
    })
}
