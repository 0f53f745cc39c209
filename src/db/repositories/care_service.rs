//! Care service repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::CareService;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait CareServiceRepository: Send + Sync {
    async fn create(&self, service: &CareService) -> Result<CareService>;

    async fn get_by_id(&self, id: i64) -> Result<Option<CareService>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<CareService>>;

    async fn list(&self) -> Result<Vec<CareService>>;

    async fn update(&self, service: &CareService) -> Result<CareService>;

    /// Delete a service; donations that paid for it stay and lose the link
    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;
}

pub struct SqlxCareServiceRepository {
    pool: DynDatabasePool,
}

impl SqlxCareServiceRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CareServiceRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CareServiceRepository for SqlxCareServiceRepository {
    async fn create(&self, service: &CareService) -> Result<CareService> {
        let sql = "INSERT INTO care_services (name, slug) VALUES (?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(&service.name)
                .bind(&service.slug)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create care service")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(&service.name)
                .bind(&service.slug)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create care service")?
                .last_insert_id() as i64,
        };
        Ok(CareService {
            id,
            ..service.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<CareService>> {
        let sql = "SELECT id, name, slug FROM care_services WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql).bind(id).fetch_optional(self.pool.sqlite()?).await
                    .context("Failed to get care service by ID")?;
                row.as_ref().map(row_to_service_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql).bind(id).fetch_optional(self.pool.mysql()?).await
                    .context("Failed to get care service by ID")?;
                row.as_ref().map(row_to_service_mysql).transpose()
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<CareService>> {
        let sql = "SELECT id, name, slug FROM care_services WHERE slug = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql).bind(slug).fetch_optional(self.pool.sqlite()?).await
                    .context("Failed to get care service by slug")?;
                row.as_ref().map(row_to_service_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql).bind(slug).fetch_optional(self.pool.mysql()?).await
                    .context("Failed to get care service by slug")?;
                row.as_ref().map(row_to_service_mysql).transpose()
            }
        }
    }

    async fn list(&self) -> Result<Vec<CareService>> {
        let sql = "SELECT id, name, slug FROM care_services ORDER BY id";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(sql).fetch_all(self.pool.sqlite()?).await
                    .context("Failed to list care services")?;
                rows.iter().map(row_to_service_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(sql).fetch_all(self.pool.mysql()?).await
                    .context("Failed to list care services")?;
                rows.iter().map(row_to_service_mysql).collect()
            }
        }
    }

    async fn update(&self, service: &CareService) -> Result<CareService> {
        let sql = "UPDATE care_services SET name = ?, slug = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&service.name)
                    .bind(&service.slug)
                    .bind(service.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update care service")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&service.name)
                    .bind(&service.slug)
                    .bind(service.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update care service")?;
            }
        }
        Ok(service.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_service_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_service_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        Ok(self.get_by_slug(slug).await?.is_some())
    }
}

async fn delete_service_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    sqlx::query("UPDATE transactions SET service_id = NULL WHERE service_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to detach transactions from care service")?;
    sqlx::query("DELETE FROM care_services WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete care service")?;
    tx.commit().await.context("Failed to commit care service deletion")?;
    Ok(())
}

async fn delete_service_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    sqlx::query("UPDATE transactions SET service_id = NULL WHERE service_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to detach transactions from care service")?;
    sqlx::query("DELETE FROM care_services WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete care service")?;
    tx.commit().await.context("Failed to commit care service deletion")?;
    Ok(())
}

fn row_to_service_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<CareService> {
    Ok(CareService {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
    })
}

fn row_to_service_mysql(row: &sqlx::mysql::MySqlRow) -> Result<CareService> {
    Ok(CareService {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
    })
}
