//! Donation ledger service

use crate::db::repositories::{
    CareServiceRepository, PetRepository, TownRepository, TransactionRepository, UserRepository,
};
use crate::models::{CreateTransactionInput, Transaction, UpdateTransactionInput};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// How many donations the per-town listing returns
pub const TOWN_LEDGER_LIMIT: i64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum TransactionServiceError {
    #[error("Transaction not found: {0}")]
    NotFound(i64),

    #[error("Town not found: {0}")]
    TownNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct TransactionService {
    repo: Arc<dyn TransactionRepository>,
    user_repo: Arc<dyn UserRepository>,
    pet_repo: Arc<dyn PetRepository>,
    care_service_repo: Arc<dyn CareServiceRepository>,
    town_repo: Arc<dyn TownRepository>,
}

impl TransactionService {
    pub fn new(
        repo: Arc<dyn TransactionRepository>,
        user_repo: Arc<dyn UserRepository>,
        pet_repo: Arc<dyn PetRepository>,
        care_service_repo: Arc<dyn CareServiceRepository>,
        town_repo: Arc<dyn TownRepository>,
    ) -> Self {
        Self {
            repo,
            user_repo,
            pet_repo,
            care_service_repo,
            town_repo,
        }
    }

    pub async fn list(&self) -> Result<Vec<Transaction>, TransactionServiceError> {
        Ok(self.repo.list().await.context("Failed to list transactions")?)
    }

    pub async fn get(&self, id: i64) -> Result<Transaction, TransactionServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get transaction")?
            .ok_or(TransactionServiceError::NotFound(id))
    }

    /// The smallest donations for pets housed in the town with this slug
    pub async fn list_for_town(&self, town_slug: &str) -> Result<Vec<Transaction>, TransactionServiceError> {
        let town = self
            .town_repo
            .get_by_slug(town_slug)
            .await
            .context("Failed to get town")?
            .ok_or_else(|| TransactionServiceError::TownNotFound(town_slug.to_string()))?;

        Ok(self
            .repo
            .list_by_town(town.id, TOWN_LEDGER_LIMIT)
            .await
            .context("Failed to list town transactions")?)
    }

    pub async fn create(&self, input: CreateTransactionInput) -> Result<Transaction, TransactionServiceError> {
        check_donation(input.donation)?;
        self.check_references(input.user_id, input.pet_id, input.service_id).await?;

        let transaction = Transaction {
            id: 0,
            user_id: input.user_id,
            pet_id: input.pet_id,
            service_id: input.service_id,
            donation: input.donation,
            currency: input.currency,
            created_at: Utc::now(),
        };
        let created = self
            .repo
            .create(&transaction)
            .await
            .context("Failed to create transaction")?;
        tracing::info!("Recorded donation {}: {}", created.id, created.summary());
        Ok(created)
    }

    pub async fn update(&self, id: i64, input: UpdateTransactionInput) -> Result<Transaction, TransactionServiceError> {
        let mut transaction = self.get(id).await?;

        if let Some(donation) = input.donation {
            check_donation(donation)?;
            transaction.donation = donation;
        }
        if let Some(currency) = input.currency {
            transaction.currency = currency;
        }
        self.check_references(
            input.user_id.flatten(),
            input.pet_id.flatten(),
            input.service_id.flatten(),
        )
        .await?;
        if let Some(user_id) = input.user_id {
            transaction.user_id = user_id;
        }
        if let Some(pet_id) = input.pet_id {
            transaction.pet_id = pet_id;
        }
        if let Some(service_id) = input.service_id {
            transaction.service_id = service_id;
        }

        Ok(self
            .repo
            .update(&transaction)
            .await
            .context("Failed to update transaction")?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), TransactionServiceError> {
        self.get(id).await?;
        self.repo.delete(id).await.context("Failed to delete transaction")?;
        Ok(())
    }

    async fn check_references(
        &self,
        user_id: Option<i64>,
        pet_id: Option<i64>,
        service_id: Option<i64>,
    ) -> Result<(), TransactionServiceError> {
        if let Some(id) = user_id {
            if self.user_repo.get_by_id(id).await.context("Failed to get user")?.is_none() {
                return Err(missing("User", id));
            }
        }
        if let Some(id) = pet_id {
            if self.pet_repo.get_by_id(id).await.context("Failed to get pet")?.is_none() {
                return Err(missing("Pet", id));
            }
        }
        if let Some(id) = service_id {
            if self
                .care_service_repo
                .get_by_id(id)
                .await
                .context("Failed to get service")?
                .is_none()
            {
                return Err(missing("Service", id));
            }
        }
        Ok(())
    }
}

fn missing(kind: &str, id: i64) -> TransactionServiceError {
    TransactionServiceError::ValidationError(format!("{} {} does not exist", kind, id))
}

fn check_donation(amount: f64) -> Result<(), TransactionServiceError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(TransactionServiceError::ValidationError(
            "Donation must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}
