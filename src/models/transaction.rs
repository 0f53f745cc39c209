//! Donation ledger entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{self, Currency};

/// A donation. Every reference is weak: deleting the user, pet or service
/// clears the link and keeps the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: Option<i64>,
    pub pet_id: Option<i64>,
    pub service_id: Option<i64>,
    pub donation: f64,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Human readable amount, e.g. `Sum of donation: 100.0 USD`
    pub fn summary(&self) -> String {
        catalog::normalize(self.donation, self.currency)
    }
}

#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    pub user_id: Option<i64>,
    pub pet_id: Option<i64>,
    pub service_id: Option<i64>,
    pub donation: f64,
    pub currency: Currency,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    pub user_id: Option<Option<i64>>,
    pub pet_id: Option<Option<i64>>,
    pub service_id: Option<Option<i64>>,
    pub donation: Option<f64>,
    pub currency: Option<Currency>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_uses_currency() {
        let tx = Transaction {
            id: 1,
            user_id: None,
            pet_id: None,
            service_id: None,
            donation: 7612.0,
            currency: Currency::Usd,
            created_at: Utc::now(),
        };
        assert_eq!(tx.summary(), "Sum of donation: 100.0 USD");
    }
}
