//! Support tickets: list/get/create/update, comments, share links.
//!
//! Like projects, tickets trace through CRM links or direct assignment; like
//! service requests, a client-role user may open one directly and owns it
//! through `created_by`.

use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde_json::json;

use fieldops_audit::{AuditAction, AuditEntry};
use fieldops_auth::{AccessScope, Capability, CapabilityPair, Principal, ShareGrant};
use fieldops_core::TicketId;
use fieldops_crm::sanitize::sanitize_ticket;
use fieldops_crm::{Communication, Ticket, TicketStatus};

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, RequestMeta};

const VIEW: CapabilityPair =
    CapabilityPair::new(Capability::ViewAllTickets, Capability::ViewOwnTickets);
const MANAGE: CapabilityPair =
    CapabilityPair::new(Capability::ManageAllTickets, Capability::ManageOwnTickets);

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_tickets).post(create_ticket))
        .route("/:id", get(get_ticket).patch(update_ticket))
        .route("/:id/comments", post(add_comment))
        .route("/:id/share", post(issue_share))
}

fn load_guarded(
    services: &AppServices,
    principal: &Principal,
    id: TicketId,
    pair: CapabilityPair,
) -> Result<(Ticket, AccessScope), axum::response::Response> {
    let scope = common::granted_scope(principal, pair)?;

    let ticket = match services.store.tickets.get(id) {
        Ok(Some(ticket)) => ticket,
        Ok(None) => return Err(errors::not_found()),
        Err(e) => return Err(errors::store_error_to_response(e)),
    };

    let owned = services.owned_for(principal.id);
    common::require_in_scope(scope, principal, &ticket.ownership(), &owned, pair)?;
    Ok((ticket, scope))
}

pub async fn list_tickets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let tickets = match services.store.tickets.all() {
        Ok(tickets) => tickets,
        Err(e) => return errors::store_error_to_response(e),
    };

    let owned = services.owned_for(principal.id);
    let items = common::filter_visible(tickets, &principal, VIEW, owned, |t| t.ownership())
        .into_iter()
        .map(|t| sanitize_ticket(t, principal.role))
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(json!({ "items": items }))).into_response()
}

pub async fn create_ticket(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Json(body): Json<dto::CreateTicketRequest>,
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

    let (client_id, lead_id) = match scope {
        AccessScope::All => (body.client_id, body.lead_id),
        AccessScope::Own => (None, None),
    };

    // The number is generated from the row count under the same lock as the
    // insert; tickets have no delete surface, so the sequence is monotonic
    // and two concurrent creates cannot mint the same number.
    let id = TicketId::new();
    let created = services.store.tickets.insert_with(id, |count| Ticket {
        id,
        number: format!("T-{}", 1000 + count + 1),
        subject: body.subject,
        client_id,
        lead_id,
        created_by: Some(principal.id),
        assigned_to: None,
        status: TicketStatus::Open,
        internal_notes: None,
        communications: Vec::new(),
        share: None,
        created_at: Utc::now(),
    });
    let ticket = match created {
        Ok(ticket) => ticket,
        Err(e) => return errors::store_error_to_response(e),
    };

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::TicketCreate, "ticket")
            .entity(ticket.id, ticket.number.clone())
            .request(meta.ip, meta.user_agent),
    );

    (
        StatusCode::CREATED,
        Json(sanitize_ticket(ticket, principal.role)),
    )
        .into_response()
}

pub async fn get_ticket(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<TicketId>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match load_guarded(&services, &principal, id, VIEW) {
        Ok((ticket, _)) => (
            StatusCode::OK,
            Json(sanitize_ticket(ticket, principal.role)),
        )
            .into_response(),
        Err(resp) => resp,
    }
}

pub async fn update_ticket(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<TicketId>,
    Json(body): Json<dto::UpdateTicketRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let scope = match load_guarded(&services, &principal, id, MANAGE) {
        Ok((_, scope)) => scope,
        Err(resp) => return resp,
    };

    let internal_notes = principal.role.is_staff().then_some(body.internal_notes).flatten();
    let assigned_to = match scope {
        AccessScope::All => body.assigned_to,
        AccessScope::Own => None,
    };

    let updated = services.store.tickets.update(id, |ticket| {
        if let Some(status) = body.status {
            ticket.status = status;
        }
        if let Some(user) = assigned_to {
            ticket.assigned_to = Some(user);
        }
        if let Some(notes) = internal_notes {
            ticket.internal_notes = Some(notes);
        }
    });

    let ticket = match updated {
        Ok(Some(ticket)) => ticket,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::TicketUpdate, "ticket")
            .entity(ticket.id, ticket.number.clone())
            .request(meta.ip, meta.user_agent),
    );

    (
        StatusCode::OK,
        Json(sanitize_ticket(ticket, principal.role)),
    )
        .into_response()
}

pub async fn add_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<TicketId>,
    Json(body): Json<dto::CommentRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    if let Err(resp) = load_guarded(&services, &principal, id, MANAGE) {
        return resp;
    }

    if body.body.trim().is_empty() {
        return errors::validation_error("body", "comment must not be empty");
    }
    if body.internal && !principal.role.is_staff() {
        return errors::validation_error("internal", "internal comments are staff-only");
    }

    let comment = Communication {
        author_id: Some(principal.id),
        body: body.body,
        internal: body.internal,
        sent_at: Utc::now(),
    };

    let updated = services.store.tickets.update(id, |ticket| {
        ticket.communications.push(comment.clone());
    });

    let ticket = match updated {
        Ok(Some(ticket)) => ticket,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::TicketComment, "ticket")
            .entity(ticket.id, ticket.number.clone())
            .request(meta.ip, meta.user_agent),
    );

    (StatusCode::CREATED, Json(comment)).into_response()
}

pub async fn issue_share(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<TicketId>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    // Issuing a public link is staff-only, unlike the other ticket actions.
    if let Err(resp) = common::require_capability(&principal, Capability::ManageAllTickets) {
        return resp;
    }

    let ticket = match services.store.tickets.get(id) {
        Ok(Some(ticket)) => ticket,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    let grant = ShareGrant::issue(ticket.number.clone(), Utc::now());
    if let Err(e) = services.store.tickets.update(id, |ticket| {
        ticket.share = Some(grant.clone());
    }) {
        return errors::store_error_to_response(e);
    }

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::TicketShare, "ticket")
            .entity(ticket.id, ticket.number.clone())
            .request(meta.ip, meta.user_agent),
    );

    (StatusCode::CREATED, Json(grant)).into_response()
}
