//! Country model

use serde::{Deserialize, Serialize};

/// Top of the location hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl Country {
    pub fn new(name: String, slug: String) -> Self {
        Self { id: 0, name, slug }
    }
}

/// Input for creating a country; the slug is derived from the name when omitted
#[derive(Debug, Clone)]
pub struct CreateCountryInput {
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCountryInput {
    pub name: Option<String>,
    pub slug: Option<String>,
}
