//! Pet model
//!
//! Pets carry four engagement counters that stay `None` until first
//! recorded. The listing order and the rating are computed in
//! [`crate::catalog`]; this module only wires pets into those functions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::{self, EngagementCounters, Filterable, MissingCounterError, PetAttributes, Ranked};

/// Breed recorded when none is given
pub const DEFAULT_BREED: &str = "no breed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: i64,
    pub family: PetFamily,
    pub name: String,
    pub birthday: DateTime<Utc>,
    /// Set once, when the pet is first published
    pub pub_date: DateTime<Utc>,
    pub gender: Gender,
    pub breed: String,
    /// Cleared when the shelter is deleted
    pub shelter_id: Option<i64>,
    pub taken_home: bool,
    pub in_favorites: Option<u32>,
    pub take_a_walk: Option<u32>,
    pub take_a_home: Option<u32>,
    pub visit_counter: Option<u32>,
}

impl Pet {
    pub fn counters(&self) -> EngagementCounters {
        EngagementCounters {
            in_favorites: self.in_favorites,
            take_a_home: self.take_a_home,
            take_a_walk: self.take_a_walk,
            visit_counter: self.visit_counter,
        }
    }

    pub fn rating(&self) -> Result<u32, MissingCounterError> {
        catalog::rating(&self.counters())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetFamily {
    Cat,
    Dog,
    Snake,
}

impl PetFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            PetFamily::Cat => "cat",
            PetFamily::Dog => "dog",
            PetFamily::Snake => "snake",
        }
    }
}

impl fmt::Display for PetFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PetFamily {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cat" => Ok(PetFamily::Cat),
            "dog" => Ok(PetFamily::Dog),
            "snake" => Ok(PetFamily::Snake),
            _ => Err(anyhow::anyhow!("Invalid pet family: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            _ => Err(anyhow::anyhow!("Invalid gender: {}", s)),
        }
    }
}

/// A pet together with the slugs of its shelter's town and country.
///
/// This is the unit the catalog is ordered and filtered over.
#[derive(Debug, Clone, PartialEq)]
pub struct PetListing {
    pub pet: Pet,
    pub town_slug: Option<String>,
    pub country_slug: Option<String>,
}

impl Ranked for PetListing {
    fn id(&self) -> i64 {
        self.pet.id
    }

    fn counters(&self) -> EngagementCounters {
        self.pet.counters()
    }
}

impl Filterable for PetListing {
    fn attributes(&self) -> PetAttributes<'_> {
        PetAttributes {
            name: &self.pet.name,
            gender: self.pet.gender.as_str(),
            family: self.pet.family.as_str(),
            town_slug: self.town_slug.as_deref(),
            country_slug: self.country_slug.as_deref(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePetInput {
    pub family: PetFamily,
    pub name: String,
    pub birthday: DateTime<Utc>,
    pub gender: Option<Gender>,
    pub breed: Option<String>,
    pub shelter_id: Option<i64>,
    pub taken_home: bool,
    pub counters: EngagementCounters,
}

/// Partial pet update. For the nullable fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct UpdatePetInput {
    pub family: Option<PetFamily>,
    pub name: Option<String>,
    pub birthday: Option<DateTime<Utc>>,
    pub gender: Option<Gender>,
    pub breed: Option<String>,
    pub shelter_id: Option<Option<i64>>,
    pub taken_home: Option<bool>,
    pub in_favorites: Option<Option<u32>>,
    pub take_a_walk: Option<Option<u32>>,
    pub take_a_home: Option<Option<u32>>,
    pub visit_counter: Option<Option<u32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet(name: &str) -> Pet {
        Pet {
            id: 1,
            family: PetFamily::Dog,
            name: name.to_string(),
            birthday: Utc::now(),
            pub_date: Utc::now(),
            gender: Gender::default(),
            breed: DEFAULT_BREED.to_string(),
            shelter_id: None,
            taken_home: false,
            in_favorites: None,
            take_a_walk: None,
            take_a_home: None,
            visit_counter: None,
        }
    }

    #[test]
    fn test_rating_needs_all_counters() {
        let mut rex = pet("Rex");
        assert!(rex.rating().is_err());

        rex.in_favorites = Some(10);
        rex.take_a_home = Some(10);
        rex.take_a_walk = Some(10);
        assert!(rex.rating().is_err());

        rex.visit_counter = Some(10);
        assert_eq!(rex.rating(), Ok(10));
    }

    #[test]
    fn test_zero_counters_rate_zero() {
        let mut rex = pet("Rex");
        rex.in_favorites = Some(0);
        rex.take_a_home = Some(0);
        rex.take_a_walk = Some(0);
        rex.visit_counter = Some(0);
        assert_eq!(rex.rating(), Ok(0));
    }

    #[test]
    fn test_listing_attributes_use_slugs() {
        let listing = PetListing {
            pet: pet("Rex"),
            town_slug: Some("kazan".to_string()),
            country_slug: None,
        };

        let attrs = listing.attributes();
        assert_eq!(attrs.family, "dog");
        assert_eq!(attrs.gender, "male");
        assert_eq!(attrs.town_slug, Some("kazan"));
        assert_eq!(attrs.country_slug, None);
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("snake".parse::<PetFamily>().unwrap(), PetFamily::Snake);
        assert!("hamster".parse::<PetFamily>().is_err());
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
        assert!("other".parse::<Gender>().is_err());
        assert_eq!(Gender::default(), Gender::Male);
    }
}
