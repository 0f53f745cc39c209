//! Services layer - Business logic
//!
//! Services validate input, enforce uniqueness and reference rules, and
//! coordinate the repositories. The ranking, filtering and currency rules
//! they apply live in [`crate::catalog`].

pub mod care_service;
pub mod confirmation;
pub mod country;
pub mod email;
pub mod pet;
pub mod rate_limiter;
pub mod shelter;
pub mod slug;
pub mod town;
pub mod transaction;
pub mod user;
pub mod validation;

pub use care_service::{CareServiceCatalog, CareServiceError};
pub use confirmation::{generate_code, hash_code, verify_code};
pub use country::{CountryService, CountryServiceError};
pub use email::{sender_from_config, CodeSender, LogSender, SmtpSender};
pub use pet::{PetService, PetServiceError};
pub use rate_limiter::AuthRateLimiter;
pub use shelter::{ShelterService, ShelterServiceError};
pub use slug::{generate_slug, is_valid_slug, SlugError};
pub use town::{TownService, TownServiceError};
pub use transaction::{TransactionService, TransactionServiceError};
pub use user::{UserService, UserServiceError};
