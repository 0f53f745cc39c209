//! Care service model
//!
//! Something a donation can pay for: food, vaccination, transport.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareService {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl CareService {
    pub fn new(name: String, slug: String) -> Self {
        Self { id: 0, name, slug }
    }
}

#[derive(Debug, Clone)]
pub struct CreateCareServiceInput {
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCareServiceInput {
    pub name: Option<String>,
    pub slug: Option<String>,
}
