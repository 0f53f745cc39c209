//! petshelter - backend for a pet adoption and shelter donation platform
//!
//! - [`catalog`]: pet rating, catalog order, filtering and donation display
//! - [`services`]: business rules over the repositories in [`db`]
//! - [`api`]: the axum HTTP surface under `/api/v1`

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
