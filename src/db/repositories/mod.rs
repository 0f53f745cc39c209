//! Database repositories
//!
//! One repository per entity. Deletes never cascade: every repository that
//! owns a referenced table clears the references inside the same database
//! transaction before removing the row.

pub mod care_service;
pub mod country;
pub mod pet;
pub mod session;
pub mod shelter;
pub mod town;
pub mod transaction;
pub mod user;

pub use care_service::{CareServiceRepository, SqlxCareServiceRepository};
pub use country::{CountryRepository, SqlxCountryRepository};
pub use pet::{PetRepository, SqlxPetRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use shelter::{ShelterRepository, SqlxShelterRepository};
pub use town::{SqlxTownRepository, TownRepository};
pub use transaction::{SqlxTransactionRepository, TransactionRepository};
pub use user::{SqlxUserRepository, UserRepository};
