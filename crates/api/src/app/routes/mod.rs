use axum::{routing::get, Router};

pub mod auth;
pub mod clients;
pub mod common;
pub mod inventory;
pub mod invoices;
pub mod leads;
pub mod projects;
pub mod public;
pub mod quotes;
pub mod service_requests;
pub mod system;
pub mod tickets;
pub mod users;

/// Router for all session-resolved endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/clients", clients::router())
        .nest("/leads", leads::router())
        .nest("/service-requests", service_requests::router())
        .nest("/projects", projects::router())
        .nest("/quotes", quotes::router())
        .nest("/invoices", invoices::router())
        .nest("/tickets", tickets::router())
        .nest("/inventory", inventory::router())
}
