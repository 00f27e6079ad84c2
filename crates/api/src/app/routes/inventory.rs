//! Inventory: unscoped view/manage capabilities, no ownership filtering.

use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use fieldops_audit::{AuditAction, AuditEntry};
use fieldops_auth::Capability;
use fieldops_core::InventoryItemId;
use fieldops_crm::InventoryItem;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::errors;
use crate::context::{PrincipalContext, RequestMeta};

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub sku: String,
    pub name: String,
    pub quantity: Option<i64>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub location: Option<String>,
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:id", get(get_item).patch(update_item))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ViewInventory) {
        return resp;
    }

    match services.store.inventory.all() {
        Ok(items) => (StatusCode::OK, Json(json!({ "items": items }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<InventoryItemId>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ViewInventory) {
        return resp;
    }

    match services.store.inventory.get(id) {
        Ok(Some(item)) => (StatusCode::OK, Json(item)).into_response(),
        Ok(None) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Json(body): Json<CreateItemRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ManageInventory) {
        return resp;
    }

    if body.sku.trim().is_empty() {
        return errors::validation_error("sku", "sku must not be empty");
    }

    let mut item = InventoryItem::new(body.sku, body.name, Utc::now());
    item.quantity = body.quantity.unwrap_or(0);
    item.location = body.location;

    if let Err(e) = services.store.inventory.insert(item.id, item.clone()) {
        return errors::store_error_to_response(e);
    }

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::InventoryCreate, "inventory_item")
            .entity(item.id, item.sku.clone())
            .request(meta.ip, meta.user_agent),
    );

    (StatusCode::CREATED, Json(item)).into_response()
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<InventoryItemId>,
    Json(body): Json<UpdateItemRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ManageInventory) {
        return resp;
    }

    let updated = services.store.inventory.update(id, |item| {
        if let Some(name) = body.name {
            item.name = name;
        }
        if let Some(quantity) = body.quantity {
            item.quantity = quantity;
        }
        if let Some(location) = body.location {
            item.location = Some(location);
        }
    });

    let item = match updated {
        Ok(Some(item)) => item,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::InventoryUpdate, "inventory_item")
            .entity(item.id, item.sku.clone())
            .request(meta.ip, meta.user_agent),
    );

    (StatusCode::OK, Json(item)).into_response()
}
