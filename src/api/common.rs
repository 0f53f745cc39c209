//! Common API utilities and shared types

use serde::{Deserialize, Deserializer};

/// Deserialize a nullable field of a partial update.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]`:
/// a missing key stays `None`, `null` becomes `Some(None)`, and a value
/// becomes `Some(Some(value))`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `?search=` on list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}
