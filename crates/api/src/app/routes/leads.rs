//! Lead directory, the sales-side sibling of `clients`.

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
use fieldops_core::LeadId;
use fieldops_crm::sanitize::sanitize_lead;
use fieldops_crm::Lead;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, RequestMeta};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_leads).post(create_lead))
        .route("/:id", get(get_lead).patch(update_lead))
}

pub async fn list_leads(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ViewLeads) {
        return resp;
    }

    let leads = match services.store.leads.all() {
        Ok(leads) => leads,
        Err(e) => return errors::store_error_to_response(e),
    };

    let items = leads
        .into_iter()
        .map(|l| sanitize_lead(l, principal.role))
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(json!({ "items": items }))).into_response()
}

pub async fn create_lead(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Json(body): Json<dto::CreateLeadRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ManageLeads) {
        return resp;
    }

    if body.name.trim().is_empty() {
        return errors::validation_error("name", "name must not be empty");
    }

    let mut lead = Lead::new(body.name, Utc::now());
    lead.contact = body.contact;
    lead.user_id = body.user_id;
    lead.internal_notes = body.internal_notes;

    if let Err(e) = services.store.leads.insert(lead.id, lead.clone()) {
        return errors::store_error_to_response(e);
    }

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::LeadCreate, "lead")
            .entity(lead.id, lead.name.clone())
            .request(meta.ip, meta.user_agent),
    );

    (StatusCode::CREATED, Json(sanitize_lead(lead, principal.role))).into_response()
}

pub async fn get_lead(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<LeadId>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ViewLeads) {
        return resp;
    }

    match services.store.leads.get(id) {
        Ok(Some(lead)) => {
            (StatusCode::OK, Json(sanitize_lead(lead, principal.role))).into_response()
        }
        Ok(None) => errors::not_found(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_lead(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<LeadId>,
    Json(body): Json<dto::UpdateLeadRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ManageLeads) {
        return resp;
    }

    let updated = services.store.leads.update(id, |lead| {
        if let Some(name) = body.name {
            lead.name = name;
        }
        if let Some(contact) = body.contact {
            lead.contact = contact;
        }
        if let Some(status) = body.status {
            lead.status = status;
        }
        if let Some(user_id) = body.user_id {
            lead.user_id = Some(user_id);
        }
        if let Some(notes) = body.internal_notes {
            lead.internal_notes = Some(notes);
        }
    });

    let lead = match updated {
        Ok(Some(lead)) => lead,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::LeadUpdate, "lead")
            .entity(lead.id, lead.name.clone())
            .request(meta.ip, meta.user_agent),
    );

    (StatusCode::OK, Json(sanitize_lead(lead, principal.role))).into_response()
}
