//! Town model

use serde::{Deserialize, Serialize};

use super::Country;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Town {
    pub id: i64,
    pub name: String,
    pub slug: String,
    /// Cleared when the country is deleted
    pub country_id: Option<i64>,
}

impl Town {
    pub fn new(name: String, slug: String, country_id: Option<i64>) -> Self {
        Self {
            id: 0,
            name,
            slug,
            country_id,
        }
    }
}

/// A town joined with its country, as shown to API clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TownWithCountry {
    pub town: Town,
    pub country: Option<Country>,
}

/// Input for creating a town. The country is referenced by slug.
#[derive(Debug, Clone)]
pub struct CreateTownInput {
    pub name: String,
    pub slug: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTownInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    /// `Some(None)` detaches the town from its country
    pub country: Option<Option<String>>,
}
