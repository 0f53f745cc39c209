//! Shelter model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelter {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub address: String,
    /// Cleared when the town is deleted
    pub town_id: Option<i64>,
}

impl Shelter {
    pub fn new(name: String, slug: String, address: String, town_id: Option<i64>) -> Self {
        Self {
            id: 0,
            name,
            slug,
            address,
            town_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateShelterInput {
    pub name: String,
    pub slug: Option<String>,
    pub address: String,
    pub town_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateShelterInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub address: Option<String>,
    pub town_id: Option<Option<i64>>,
}
