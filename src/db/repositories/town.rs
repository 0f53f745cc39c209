//! Town repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Town;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait TownRepository: Send + Sync {
    async fn create(&self, town: &Town) -> Result<Town>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Town>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Town>>;

    /// All towns ordered by name
    async fn list(&self) -> Result<Vec<Town>>;

    async fn update(&self, town: &Town) -> Result<Town>;

    /// Delete a town; its shelters stay and lose their town
    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;
}

pub struct SqlxTownRepository {
    pool: DynDatabasePool,
}

impl SqlxTownRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TownRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TownRepository for SqlxTownRepository {
    async fn create(&self, town: &Town) -> Result<Town> {
        let sql = "INSERT INTO towns (name, slug, country_id) VALUES (?, ?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(&town.name)
                .bind(&town.slug)
                .bind(town.country_id)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create town")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(&town.name)
                .bind(&town.slug)
                .bind(town.country_id)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create town")?
                .last_insert_id() as i64,
        };
        Ok(Town { id, ..town.clone() })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Town>> {
        let sql = "SELECT id, name, slug, country_id FROM towns WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql).bind(id).fetch_optional(self.pool.sqlite()?).await
                    .context("Failed to get town by ID")?;
                row.as_ref().map(row_to_town_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql).bind(id).fetch_optional(self.pool.mysql()?).await
                    .context("Failed to get town by ID")?;
                row.as_ref().map(row_to_town_mysql).transpose()
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Town>> {
        let sql = "SELECT id, name, slug, country_id FROM towns WHERE slug = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql).bind(slug).fetch_optional(self.pool.sqlite()?).await
                    .context("Failed to get town by slug")?;
                row.as_ref().map(row_to_town_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql).bind(slug).fetch_optional(self.pool.mysql()?).await
                    .context("Failed to get town by slug")?;
                row.as_ref().map(row_to_town_mysql).transpose()
            }
        }
    }

    async fn list(&self) -> Result<Vec<Town>> {
        let sql = "SELECT id, name, slug, country_id FROM towns ORDER BY name, id";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(sql).fetch_all(self.pool.sqlite()?).await
                    .context("Failed to list towns")?;
                rows.iter().map(row_to_town_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(sql).fetch_all(self.pool.mysql()?).await
                    .context("Failed to list towns")?;
                rows.iter().map(row_to_town_mysql).collect()
            }
        }
    }

    async fn update(&self, town: &Town) -> Result<Town> {
        let sql = "UPDATE towns SET name = ?, slug = ?, country_id = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&town.name)
                    .bind(&town.slug)
                    .bind(town.country_id)
                    .bind(town.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update town")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&town.name)
                    .bind(&town.slug)
                    .bind(town.country_id)
                    .bind(town.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update town")?;
            }
        }
        Ok(town.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_town_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_town_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        Ok(self.get_by_slug(slug).await?.is_some())
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn delete_town_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    sqlx::query("UPDATE shelters SET town_id = NULL WHERE town_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to detach shelters from town")?;
    sqlx::query("DELETE FROM towns WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete town")?;
    tx.commit().await.context("Failed to commit town deletion")?;
    Ok(())
}

fn row_to_town_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Town> {
    Ok(Town {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        country_id: row.try_get("country_id")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn delete_town_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    sqlx::query("UPDATE shelters SET town_id = NULL WHERE town_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to detach shelters from town")?;
    sqlx::query("DELETE FROM towns WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete town")?;
    tx.commit().await.context("Failed to commit town deletion")?;
    Ok(())
}

fn row_to_town_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Town> {
    Ok(Town {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        country_id: row.try_get("country_id")?,
    })
}
