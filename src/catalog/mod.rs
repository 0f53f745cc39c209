//! Computed values over catalog data.
//!
//! Everything here is synchronous and free of I/O: the callers fetch the
//! records, these functions score, order, filter and format them.

pub mod currency;
pub mod filter;
pub mod ranking;

pub use currency::{describe_donation, normalize, Currency, UnknownCurrencyError};
pub use filter::{Filterable, PetAttributes, PetFilter};
pub use ranking::{rating, sort_catalog, EngagementCounters, MissingCounterError, Ranked};
