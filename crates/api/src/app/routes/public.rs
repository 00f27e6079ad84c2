//! Unauthenticated surface: quote-request submission and share-token reads.
//!
//! No session, no guard. Everything returned here passes the non-admin
//! sanitizer, and every share-link failure answers with the same body so a
//! caller cannot probe which record numbers exist.

use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use fieldops_audit::{AuditAction, AuditEntry};
use fieldops_auth::{Role, ShareGrant, ShareTokenError};
use fieldops_crm::sanitize::{sanitize_invoice, sanitize_project, sanitize_quote, sanitize_ticket};
use fieldops_crm::{Lead, QuoteStatus};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::RequestMeta;

pub fn router() -> Router {
    Router::new()
        .route("/quote-requests", post(submit_quote_request))
        .route("/quotes/:number", get(view_quote))
        .route("/quotes/:number/approve", post(approve_quote))
        .route("/invoices/:number", get(view_invoice))
        .route("/projects/:number", get(view_project))
        .route("/tickets/:number", get(view_ticket))
}

#[derive(Debug, Deserialize)]
pub struct ShareQuery {
    pub token: Option<String>,
}

fn share_rejected() -> axum::response::Response {
    errors::share_token_error_to_response(ShareTokenError::TokenMismatch)
}

/// Validate `token` against a record's grant. `None` anywhere is the same
/// uniform rejection as a wrong token.
fn validate_share(
    grant: Option<&ShareGrant>,
    token: Option<&str>,
    number: &str,
) -> Result<(), axum::response::Response> {
    let (Some(grant), Some(token)) = (grant, token) else {
        return Err(share_rejected());
    };

    grant
        .validate(token, number, Utc::now())
        .map_err(errors::share_token_error_to_response)
}

pub async fn submit_quote_request(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Json(body): Json<dto::QuoteRequestSubmission>,
) -> axum::response::Response {
    if body.name.trim().is_empty() {
        return errors::validation_error("name", "name must not be empty");
    }
    if body.email.trim().is_empty() || !body.email.contains('@') {
        return errors::validation_error("email", "a valid email is required");
    }

    let mut lead = Lead::new(body.name, Utc::now());
    lead.contact.email = Some(body.email);
    lead.contact.phone = body.phone;
    lead.internal_notes = body.message;

    if let Err(e) = services.store.leads.insert(lead.id, lead.clone()) {
        return errors::store_error_to_response(e);
    }

    let meta = RequestMeta::from_headers(&headers);
    services.record_audit(
        AuditEntry::new(None, AuditAction::PublicQuoteRequest, "lead")
            .entity(lead.id, lead.name.clone())
            .request(meta.ip, meta.user_agent),
    );

    (
        StatusCode::CREATED,
        Json(json!({ "message": "thanks, we will be in touch shortly" })),
    )
        .into_response()
}

pub async fn view_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
    Query(query): Query<ShareQuery>,
) -> axum::response::Response {
    let quote = match services.store.quotes.find(|q| q.number == number) {
        Ok(Some(quote)) => quote,
        Ok(None) => return share_rejected(),
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Err(resp) = validate_share(quote.share.as_ref(), query.token.as_deref(), &number) {
        return resp;
    }

    (StatusCode::OK, Json(sanitize_quote(quote, Role::Client))).into_response()
}

pub async fn approve_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
    Query(query): Query<ShareQuery>,
    headers: HeaderMap,
) -> axum::response::Response {
    let quote = match services.store.quotes.find(|q| q.number == number) {
        Ok(Some(quote)) => quote,
        Ok(None) => return share_rejected(),
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Err(resp) = validate_share(quote.share.as_ref(), query.token.as_deref(), &number) {
        return resp;
    }

    if quote.status == QuoteStatus::Declined {
        return errors::json_error(
            StatusCode::CONFLICT,
            "conflict",
            "a declined quote cannot be approved",
        );
    }

    let updated = services.store.quotes.update(quote.id, |quote| {
        quote.status = QuoteStatus::Approved;
    });
    let quote = match updated {
        Ok(Some(quote)) => quote,
        Ok(None) => return share_rejected(),
        Err(e) => return errors::store_error_to_response(e),
    };

    let meta = RequestMeta::from_headers(&headers);
    services.record_audit(
        AuditEntry::new(None, AuditAction::QuoteApprove, "quote")
            .entity(quote.id, quote.number.clone())
            .details(json!({ "via": "share_link" }))
            .request(meta.ip, meta.user_agent),
    );

    (StatusCode::OK, Json(sanitize_quote(quote, Role::Client))).into_response()
}

pub async fn view_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
    Query(query): Query<ShareQuery>,
) -> axum::response::Response {
    let invoice = match services.store.invoices.find(|i| i.number == number) {
        Ok(Some(invoice)) => invoice,
        Ok(None) => return share_rejected(),
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Err(resp) = validate_share(invoice.share.as_ref(), query.token.as_deref(), &number) {
        return resp;
    }

    (StatusCode::OK, Json(sanitize_invoice(invoice, Role::Client))).into_response()
}

pub async fn view_project(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
    Query(query): Query<ShareQuery>,
) -> axum::response::Response {
    let project = match services.store.projects.find(|p| p.number == number) {
        Ok(Some(project)) => project,
        Ok(None) => return share_rejected(),
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Err(resp) = validate_share(project.share.as_ref(), query.token.as_deref(), &number) {
        return resp;
    }

    (StatusCode::OK, Json(sanitize_project(project, Role::Client))).into_response()
}

pub async fn view_ticket(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
    Query(query): Query<ShareQuery>,
) -> axum::response::Response {
    let ticket = match services.store.tickets.find(|t| t.number == number) {
        Ok(Some(ticket)) => ticket,
        Ok(None) => return share_rejected(),
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Err(resp) = validate_share(ticket.share.as_ref(), query.token.as_deref(), &number) {
        return resp;
    }

    (StatusCode::OK, Json(sanitize_ticket(ticket, Role::Client))).into_response()
}
