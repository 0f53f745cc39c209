//! Country repository
//!
//! Deleting a country detaches its towns instead of removing them.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Country;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait CountryRepository: Send + Sync {
    async fn create(&self, country: &Country) -> Result<Country>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Country>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Country>>;

    /// All countries ordered by name
    async fn list(&self) -> Result<Vec<Country>>;

    async fn update(&self, country: &Country) -> Result<Country>;

    /// Delete a country after clearing `towns.country_id` references to it
    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;
}

pub struct SqlxCountryRepository {
    pool: DynDatabasePool,
}

impl SqlxCountryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CountryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CountryRepository for SqlxCountryRepository {
    async fn create(&self, country: &Country) -> Result<Country> {
        let sql = "INSERT INTO countries (name, slug) VALUES (?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(&country.name)
                .bind(&country.slug)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create country")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(&country.name)
                .bind(&country.slug)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create country")?
                .last_insert_id() as i64,
        };
        Ok(Country {
            id,
            ..country.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Country>> {
        let sql = "SELECT id, name, slug FROM countries WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql).bind(id).fetch_optional(self.pool.sqlite()?).await
                    .context("Failed to get country by ID")?;
                row.as_ref().map(row_to_country_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql).bind(id).fetch_optional(self.pool.mysql()?).await
                    .context("Failed to get country by ID")?;
                row.as_ref().map(row_to_country_mysql).transpose()
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Country>> {
        let sql = "SELECT id, name, slug FROM countries WHERE slug = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql).bind(slug).fetch_optional(self.pool.sqlite()?).await
                    .context("Failed to get country by slug")?;
                row.as_ref().map(row_to_country_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql).bind(slug).fetch_optional(self.pool.mysql()?).await
                    .context("Failed to get country by slug")?;
                row.as_ref().map(row_to_country_mysql).transpose()
            }
        }
    }

    async fn list(&self) -> Result<Vec<Country>> {
        let sql = "SELECT id, name, slug FROM countries ORDER BY name, id";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(sql).fetch_all(self.pool.sqlite()?).await
                    .context("Failed to list countries")?;
                rows.iter().map(row_to_country_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(sql).fetch_all(self.pool.mysql()?).await
                    .context("Failed to list countries")?;
                rows.iter().map(row_to_country_mysql).collect()
            }
        }
    }

    async fn update(&self, country: &Country) -> Result<Country> {
        let sql = "UPDATE countries SET name = ?, slug = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&country.name)
                    .bind(&country.slug)
                    .bind(country.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update country")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&country.name)
                    .bind(&country.slug)
                    .bind(country.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update country")?;
            }
        }
        Ok(country.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_country_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_country_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        Ok(self.get_by_slug(slug).await?.is_some())
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn delete_country_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    sqlx::query("UPDATE towns SET country_id = NULL WHERE country_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to detach towns from country")?;
    sqlx::query("DELETE FROM countries WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete country")?;
    tx.commit().await.context("Failed to commit country deletion")?;
    Ok(())
}

fn row_to_country_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Country> {
    Ok(Country {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn delete_country_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    sqlx::query("UPDATE towns SET country_id = NULL WHERE country_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to detach towns from country")?;
    sqlx::query("DELETE FROM countries WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete country")?;
    tx.commit().await.context("Failed to commit country deletion")?;
    Ok(())
}

fn row_to_country_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Country> {
    Ok(Country {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
    })
}
