//! Transaction (donation) API endpoints
//!
//! - GET /api/v1/transactions
//! - GET /api/v1/transactions/{id}
//! - GET /api/v1/transactions/town/{slug} - Smallest donations for pets in a town
//! - POST, PATCH, DELETE - Admin only

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::nullable;
use crate::api::middleware::{ApiError, AppState};
use crate::catalog::Currency;
use crate::models::{CreateTransactionInput, Transaction, UpdateTransactionInput};
use crate::services::TransactionServiceError;

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: i64,
    pub user: Option<i64>,
    pub pet: Option<i64>,
    pub service: Option<i64>,
    pub donation: f64,
    pub currency: Currency,
    pub created_at: String,
    /// e.g. `Sum of donation: 100.0 USD`
    pub summary: String,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            summary: transaction.summary(),
            id: transaction.id,
            user: transaction.user_id,
            pet: transaction.pet_id,
            service: transaction.service_id,
            donation: transaction.donation,
            currency: transaction.currency,
            created_at: transaction.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub user: Option<i64>,
    pub pet: Option<i64>,
    pub service: Option<i64>,
    pub donation: f64,
    #[serde(default)]
    pub currency: Currency,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub user: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub pet: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub service: Option<Option<i64>>,
    pub donation: Option<f64>,
    pub currency: Option<Currency>,
}

impl From<TransactionServiceError> for ApiError {
    fn from(error: TransactionServiceError) -> Self {
        match error {
            TransactionServiceError::NotFound(id) => {
                ApiError::not_found(format!("Transaction not found: {}", id))
            }
            TransactionServiceError::TownNotFound(slug) => {
                ApiError::not_found(format!("Town not found: {}", slug))
            }
            TransactionServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            TransactionServiceError::InternalError(e) => ApiError::internal(format!("{:#}", e)),
        }
    }
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions))
        .route("/town/{slug}", get(list_town_transactions))
        .route("/{id}", get(get_transaction))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_transaction))
        .route("/{id}", patch(update_transaction).delete(delete_transaction))
}

async fn list_transactions(
    State(state): State<AppState>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let transactions = state.transaction_service.list().await?;
    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/transactions/town/{slug}
async fn list_town_transactions(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let transactions = state.transaction_service.list_for_town(&slug).await?;
    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TransactionResponse>, ApiError> {
    Ok(Json(state.transaction_service.get(id).await?.into()))
}

async fn create_transaction(
    State(state): State<AppState>,
    Json(body): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction = state
        .transaction_service
        .create(CreateTransactionInput {
            user_id: body.user,
            pet_id: body.pet,
            service_id: body.service,
            donation: body.donation,
            currency: body.currency,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(TransactionResponse::from(transaction))))
}

async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateTransactionRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let transaction = state
        .transaction_service
        .update(
            id,
            UpdateTransactionInput {
                user_id: body.user,
                pet_id: body.pet,
                service_id: body.service,
                donation: body.donation,
                currency: body.currency,
            },
        )
        .await?;
    Ok(Json(transaction.into()))
}

async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.transaction_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
