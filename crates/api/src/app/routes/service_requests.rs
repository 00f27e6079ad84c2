//! Service requests: the one record class a client-role user creates
//! directly, owned through `created_by` rather than a CRM link.

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
use fieldops_auth::{AccessScope, Capability, CapabilityPair};
use fieldops_core::ServiceRequestId;
use fieldops_crm::ServiceRequest;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, RequestMeta};

const VIEW: CapabilityPair = CapabilityPair::new(
    Capability::ViewAllServiceRequests,
    Capability::ViewOwnServiceRequests,
);
const MANAGE: CapabilityPair = CapabilityPair::new(
    Capability::ManageAllServiceRequests,
    Capability::ManageOwnServiceRequests,
);

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_service_requests).post(create_service_request))
        .route("/:id", get(get_service_request).patch(update_service_request))
}

pub async fn list_service_requests(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let requests = match services.store.service_requests.all() {
        Ok(requests) => requests,
        Err(e) => return errors::store_error_to_response(e),
    };

    let owned = services.owned_for(principal.id);
    let items = common::filter_visible(requests, &principal, VIEW, owned, |r| r.ownership());
    (StatusCode::OK, Json(json!({ "items": items }))).into_response()
}

pub async fn create_service_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Json(body): Json<dto::CreateServiceRequestRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let scope = match common::granted_scope(&principal, MANAGE) {
        Ok(scope) => scope,
        Err(resp) => return resp,
    };

    if body.subject.trim().is_empty() {
        return errors::validation_error("subject", "subject must not be empty");
    }

    // Own-scope creators always file for themselves; only the "all" scope
    // may attach a request to an arbitrary client.
    let client_id = match scope {
        AccessScope::All => body.client_id,
        AccessScope::Own => None,
    };

    let request = ServiceRequest {
        id: ServiceRequestId::new(),
        created_by: Some(principal.id),
        client_id,
        assigned_to: None,
        subject: body.subject,
        description: body.description,
        created_at: Utc::now(),
    };

    if let Err(e) = services
        .store
        .service_requests
        .insert(request.id, request.clone())
    {
        return errors::store_error_to_response(e);
    }

    services.record_audit(
        AuditEntry::new(
            Some(principal.id),
            AuditAction::ServiceRequestCreate,
            "service_request",
        )
        .entity(request.id, request.subject.clone())
        .request(meta.ip, meta.user_agent),
    );

    (StatusCode::CREATED, Json(request)).into_response()
}

pub async fn get_service_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<ServiceRequestId>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let scope = match common::granted_scope(&principal, VIEW) {
        Ok(scope) => scope,
        Err(resp) => return resp,
    };

    let request = match services.store.service_requests.get(id) {
        Ok(Some(request)) => request,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    let owned = services.owned_for(principal.id);
    if let Err(resp) =
        common::require_in_scope(scope, &principal, &request.ownership(), &owned, VIEW)
    {
        return resp;
    }

    (StatusCode::OK, Json(request)).into_response()
}

pub async fn update_service_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<ServiceRequestId>,
    Json(body): Json<dto::UpdateServiceRequestRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let scope = match common::granted_scope(&principal, MANAGE) {
        Ok(scope) => scope,
        Err(resp) => return resp,
    };

    let request = match services.store.service_requests.get(id) {
        Ok(Some(request)) => request,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    let owned = services.owned_for(principal.id);
    if let Err(resp) =
        common::require_in_scope(scope, &principal, &request.ownership(), &owned, MANAGE)
    {
        return resp;
    }

    // Reassignment is an "all"-scope action; own-scope callers only edit text.
    let assigned_to = match scope {
        AccessScope::All => body.assigned_to,
        AccessScope::Own => None,
    };

    let updated = services.store.service_requests.update(id, |request| {
        if let Some(subject) = body.subject {
            request.subject = subject;
        }
        if let Some(description) = body.description {
            request.description = description;
        }
        if let Some(user) = assigned_to {
            request.assigned_to = Some(user);
        }
    });

    let request = match updated {
        Ok(Some(request)) => request,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    services.record_audit(
        AuditEntry::new(
            Some(principal.id),
            AuditAction::ServiceRequestUpdate,
            "service_request",
        )
        .entity(request.id, request.subject.clone())
        .request(meta.ip, meta.user_agent),
    );

    (StatusCode::OK, Json(request)).into_response()
}
