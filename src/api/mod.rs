//! API layer - HTTP handlers and routing
//!
//! Everything is served under `/api/v1`. Reads of the catalog are public,
//! writes need an administrator, and `/users/me` and `/auth/logout` need
//! any signed-in user.

pub mod auth;
pub mod care_services;
pub mod common;
pub mod countries;
pub mod middleware;
pub mod pets;
pub mod shelters;
pub mod towns;
pub mod transactions;
pub mod users;

#[cfg(test)]
mod tests;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .nest("/users", users::admin_router())
        .nest("/countries", countries::admin_router())
        .nest("/towns", towns::admin_router())
        .nest("/shelters", shelters::admin_router())
        .nest("/pets", pets::admin_router())
        .nest("/services", care_services::admin_router())
        .nest("/transactions", transactions::admin_router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not admin)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/users", users::me_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .nest("/countries", countries::public_router())
        .nest("/towns", towns::public_router())
        .nest("/shelters", shelters::public_router())
        .nest("/pets", pets::public_router())
        .nest("/services", care_services::public_router())
        .nest("/transactions", transactions::public_router())
        .merge(admin_routes)
        .merge(protected_routes)
}

/// CORS for the configured origin; `*` allows any origin.
fn cors_layer(cors_origin: &str) -> anyhow::Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if cors_origin.trim() == "*" {
        return Ok(cors.allow_origin(Any));
    }
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin '{}'", cors_origin))?;
    Ok(cors.allow_origin(origin))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    Ok(Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .layer(cors_layer(cors_origin)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
