//! Transaction (donation ledger) repository
//!
//! The ledger is listed ascending by donation amount.

use crate::catalog::Currency;
use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Transaction;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn create(&self, transaction: &Transaction) -> Result<Transaction>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Transaction>>;

    /// The whole ledger, smallest donation first
    async fn list(&self) -> Result<Vec<Transaction>>;

    /// Donations for pets housed in the given town, smallest first
    async fn list_by_town(&self, town_id: i64, limit: i64) -> Result<Vec<Transaction>>;

    async fn update(&self, transaction: &Transaction) -> Result<Transaction>;

    async fn delete(&self, id: i64) -> Result<()>;
}

pub struct SqlxTransactionRepository {
    pool: DynDatabasePool,
}

impl SqlxTransactionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TransactionRepository> {
        Arc::new(Self::new(pool))
    }
}

const TRANSACTION_COLUMNS: &str =
    "tr.id, tr.user_id, tr.pet_id, tr.service_id, tr.donation, tr.currency, tr.created_at";

#[async_trait]
impl TransactionRepository for SqlxTransactionRepository {
    async fn create(&self, transaction: &Transaction) -> Result<Transaction> {
        let sql = r#"
            INSERT INTO transactions (user_id, pet_id, service_id, donation, currency, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
        "#;
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(transaction.user_id)
                .bind(transaction.pet_id)
                .bind(transaction.service_id)
                .bind(transaction.donation)
                .bind(transaction.currency.as_str())
                .bind(transaction.created_at)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to create transaction")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(transaction.user_id)
                .bind(transaction.pet_id)
                .bind(transaction.service_id)
                .bind(transaction.donation)
                .bind(transaction.currency.as_str())
                .bind(transaction.created_at)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to create transaction")?
                .last_insert_id() as i64,
        };
        Ok(Transaction {
            id,
            ..transaction.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Transaction>> {
        let sql = format!("SELECT {} FROM transactions tr WHERE tr.id = ?", TRANSACTION_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql).bind(id).fetch_optional(self.pool.sqlite()?).await
                    .context("Failed to get transaction by ID")?;
                row.as_ref().map(row_to_transaction_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql).bind(id).fetch_optional(self.pool.mysql()?).await
                    .context("Failed to get transaction by ID")?;
                row.as_ref().map(row_to_transaction_mysql).transpose()
            }
        }
    }

    async fn list(&self) -> Result<Vec<Transaction>> {
        let sql = format!(
            "SELECT {} FROM transactions tr ORDER BY tr.donation, tr.id",
            TRANSACTION_COLUMNS
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql).fetch_all(self.pool.sqlite()?).await
                    .context("Failed to list transactions")?;
                rows.iter().map(row_to_transaction_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql).fetch_all(self.pool.mysql()?).await
                    .context("Failed to list transactions")?;
                rows.iter().map(row_to_transaction_mysql).collect()
            }
        }
    }

    async fn list_by_town(&self, town_id: i64, limit: i64) -> Result<Vec<Transaction>> {
        let sql = format!(
            "SELECT {} FROM transactions tr \
             JOIN pets p ON p.id = tr.pet_id \
             JOIN shelters s ON s.id = p.shelter_id \
             WHERE s.town_id = ? \
             ORDER BY tr.donation, tr.id \
             LIMIT ?",
            TRANSACTION_COLUMNS
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .bind(town_id)
                    .bind(limit)
                    .fetch_all(self.pool.sqlite()?)
                    .await
                    .context("Failed to list transactions by town")?;
                rows.iter().map(row_to_transaction_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .bind(town_id)
                    .bind(limit)
                    .fetch_all(self.pool.mysql()?)
                    .await
                    .context("Failed to list transactions by town")?;
                rows.iter().map(row_to_transaction_mysql).collect()
            }
        }
    }

    async fn update(&self, transaction: &Transaction) -> Result<Transaction> {
        let sql = r#"
            UPDATE transactions
            SET user_id = ?, pet_id = ?, service_id = ?, donation = ?, currency = ?
            WHERE id = ?
        "#;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(transaction.user_id)
                    .bind(transaction.pet_id)
                    .bind(transaction.service_id)
                    .bind(transaction.donation)
                    .bind(transaction.currency.as_str())
                    .bind(transaction.id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to update transaction")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(transaction.user_id)
                    .bind(transaction.pet_id)
                    .bind(transaction.service_id)
                    .bind(transaction.donation)
                    .bind(transaction.currency.as_str())
                    .bind(transaction.id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to update transaction")?;
            }
        }
        Ok(transaction.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let sql = "DELETE FROM transactions WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql).bind(id).execute(self.pool.sqlite()?).await
                    .context("Failed to delete transaction")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql).bind(id).execute(self.pool.mysql()?).await
                    .context("Failed to delete transaction")?;
            }
        }
        Ok(())
    }
}

fn parse_currency(code: &str) -> Result<Currency> {
    Currency::from_str(code).with_context(|| format!("Invalid currency in database: {}", code))
}

fn row_to_transaction_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
    let currency: String = row.try_get("currency")?;
    Ok(Transaction {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        pet_id: row.try_get("pet_id")?,
        service_id: row.try_get("service_id")?,
        donation: row.try_get("donation")?,
        currency: parse_currency(&currency)?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_transaction_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Transaction> {
    let currency: String = row.try_get("currency")?;
    Ok(Transaction {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        pet_id: row.try_get("pet_id")?,
        service_id: row.try_get("service_id")?,
        donation: row.try_get("donation")?,
        currency: parse_currency(&currency)?,
        created_at: row.try_get("created_at")?,
    })
}
