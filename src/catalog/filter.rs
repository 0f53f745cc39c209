//! Substring filtering of the pet catalog.

use serde::{Deserialize, Serialize};

/// The searchable view of a pet. Town and country are the *slugs* of the
/// shelter's town and that town's country, when the chain is intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PetAttributes<'a> {
    pub name: &'a str,
    pub gender: &'a str,
    pub family: &'a str,
    pub town_slug: Option<&'a str>,
    pub country_slug: Option<&'a str>,
}

pub trait Filterable {
    fn attributes(&self) -> PetAttributes<'_>;
}

/// Catalog query. Every supplied field must be a case-sensitive substring
/// of the pet's corresponding attribute; omitted fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetFilter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

fn field_matches(needle: &Option<String>, haystack: Option<&str>) -> bool {
    match needle {
        None => true,
        // A pet without the related entity cannot satisfy a constraint on it
        Some(needle) => haystack.is_some_and(|value| value.contains(needle.as_str())),
    }
}

impl PetFilter {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.gender.is_none()
            && self.family.is_none()
            && self.town.is_none()
            && self.country.is_none()
    }

    pub fn matches(&self, pet: &PetAttributes<'_>) -> bool {
        field_matches(&self.name, Some(pet.name))
            && field_matches(&self.gender, Some(pet.gender))
            && field_matches(&self.family, Some(pet.family))
            && field_matches(&self.town, pet.town_slug)
            && field_matches(&self.country, pet.country_slug)
    }

    /// Keep the matching items, preserving their relative order.
    pub fn apply<T: Filterable>(&self, items: Vec<T>) -> Vec<T> {
        if self.is_empty() {
            return items;
        }
        items
            .into_iter()
            .filter(|item| self.matches(&item.attributes()))
            .collect()
    }
}
