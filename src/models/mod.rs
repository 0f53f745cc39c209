//! Data models
//!
//! Database entities and the plain input structs the services accept.
//! Request/response shapes live next to the handlers in `api`.

mod care_service;
mod country;
mod pet;
mod session;
mod shelter;
mod town;
mod transaction;
mod user;

pub use care_service::{CareService, CreateCareServiceInput, UpdateCareServiceInput};
pub use country::{Country, CreateCountryInput, UpdateCountryInput};
pub use pet::{CreatePetInput, Gender, Pet, PetFamily, PetListing, UpdatePetInput, DEFAULT_BREED};
pub use session::Session;
pub use shelter::{CreateShelterInput, Shelter, UpdateShelterInput};
pub use town::{CreateTownInput, Town, TownWithCountry, UpdateTownInput};
pub use transaction::{CreateTransactionInput, Transaction, UpdateTransactionInput};
pub use user::{CreateUserInput, UpdateUserInput, User, UserRole, BIO_MAX_CHARS};
