//! Client directory. Gated by the unscoped `clients.view` / `clients.manage`
//! capabilities; the ownership filter never applies here (a client-role user
//! has no capability on this surface at all).

use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use serde_json::json;

use fieldops_audit::{AuditAction, AuditEntry};
use fieldops_auth::Capability;
use fieldops_core::ClientId;
use fieldops_crm::sanitize::sanitize_client;
use fieldops_crm::Client;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, RequestMeta};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route("/:id", get(get_client).patch(update_client))
}

pub async fn list_clients(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ViewClients) {
        return resp;
    }

    let clients = match services.store.clients.all() {
        Ok(clients) => clients,
        Err(e) => return errors::store_error_to_response(e),
    };

    let items = clients
        .into_iter()
        .map(|c| sanitize_client(c, principal.role))
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(json!({ "items": items }))).into_response()
}

pub async fn create_client(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Json(body): Json<dto::CreateClientRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ManageClients) {
        return resp;
    }

    if body.name.trim().is_empty() {
        return errors::validation_error("name", "name must not be empty");
    }

    let mut client = Client::new(body.name, Utc::now());
    client.contact = body.contact;
    client.user_id = body.user_id;
    client.internal_notes = body.internal_notes;

    if let Err(e) = services.store.clients.insert(client.id, client.clone()) {
        return errors::store_error_to_response(e);
    }

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::ClientCreate, "client")
            .entity(client.id, client.name.clone())
            .request(meta.ip, meta.user_agent),
    );

    (
        StatusCode::CREATED,
        Json(sanitize_client(client, principal.role)),
    )
        .into_response()
}

pub async fn get_client(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<ClientId>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ViewClients) {
        return resp;
    }

    match services.store.clients.get(id) {
        Ok(Some(client)) => (
            StatusCode::OK,
            Json(sanitize_client(client, principal.role)),
        )
            .into_response(),
        Ok(None) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_client(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<ClientId>,
    Json(body): Json<dto::UpdateClientRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ManageClients) {
        return resp;
    }

    let updated = services.store.clients.update(id, |client| {
        if let Some(name) = body.name {
            client.name = name;
        }
        if let Some(contact) = body.contact {
            client.contact = contact;
        }
        if let Some(user_id) = body.user_id {
            client.user_id = Some(user_id);
        }
        if let Some(notes) = body.internal_notes {
            client.internal_notes = Some(notes);
        }
    });

    let client = match updated {
        Ok(Some(client)) => client,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::ClientUpdate, "client")
            .entity(client.id, client.name.clone())
            .request(meta.ip, meta.user_agent),
    );

    (
        StatusCode::OK,
        Json(sanitize_client(client, principal.role)),
    )
        .into_response()
}
