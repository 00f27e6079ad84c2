use std::sync::Arc;

use fieldops_api::app::{self, services::AppServices};

#[tokio::main]
async fn main() {
    fieldops_observability::init();

    let admin_password = std::env::var("FIELDOPS_ADMIN_PASSWORD").unwrap_or_else(|_| {
        tracing::warn!("FIELDOPS_ADMIN_PASSWORD not set; using insecure dev default");
        "dev-admin-password".to_string()
    });

    let services = Arc::new(AppServices::in_memory());
    if let Err(e) = services.seed_admin("admin@fieldops.local", &admin_password) {
        tracing::error!(error = %e, "failed to seed admin account");
    }

    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("failed to bind 0.0.0.0:8080");

    tracing::info!("listening on {}", listener.local_addr().expect("local addr"));

    axum::serve(listener, app).await.expect("server error");
}
