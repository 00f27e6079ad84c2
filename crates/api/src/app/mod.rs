//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: shared application state (stores, credentials, sessions,
//!   audit logger)
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    // Guarded routes: the session middleware resolves (or fails open past)
    // the cookie; handlers run the authorization guard themselves.
    let guarded = routes::router().layer(axum::middleware::from_fn_with_state(
        services.clone(),
        middleware::session_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/public", routes::public::router())
        .merge(guarded)
        .layer(Extension(services))
}
