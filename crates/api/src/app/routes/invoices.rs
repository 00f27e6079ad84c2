//! Invoices: CRUD, share links, and the financial summary.

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
use fieldops_core::InvoiceId;
use fieldops_crm::sanitize::sanitize_invoice;
use fieldops_crm::Invoice;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, RequestMeta};

const VIEW: CapabilityPair =
    CapabilityPair::new(Capability::ViewAllInvoices, Capability::ViewOwnInvoices);
const MANAGE: CapabilityPair =
    CapabilityPair::new(Capability::ManageAllInvoices, Capability::ManageOwnInvoices);

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/summary", get(financial_summary))
        .route("/:id", get(get_invoice).patch(update_invoice))
        .route("/:id/share", post(issue_share))
}

fn load_guarded(
    services: &AppServices,
    principal: &Principal,
    id: InvoiceId,
    pair: CapabilityPair,
) -> Result<(Invoice, AccessScope), axum::response::Response> {
    let scope = common::granted_scope(principal, pair)?;

    let invoice = match services.store.invoices.get(id) {
        Ok(Some(invoice)) => invoice,
        Ok(None) => return Err(errors::not_found()),
        Err(e) => return Err(errors::store_error_to_response(e)),
    };

    let owned = services.owned_for(principal.id);
    common::require_in_scope(scope, principal, &invoice.ownership(), &owned, pair)?;
    Ok((invoice, scope))
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let invoices = match services.store.invoices.all() {
        Ok(invoices) => invoices,
        Err(e) => return errors::store_error_to_response(e),
    };

    let owned = services.owned_for(principal.id);
    let items = common::filter_visible(invoices, &principal, VIEW, owned, |i| i.ownership())
        .into_iter()
        .map(|i| sanitize_invoice(i, principal.role))
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(json!({ "items": items }))).into_response()
}

/// Aggregate totals across all invoices; gated by `financial.view` rather
/// than the per-record pair because it reveals business-wide numbers.
pub async fn financial_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ViewFinancial) {
        return resp;
    }

    let invoices = match services.store.invoices.all() {
        Ok(invoices) => invoices,
        Err(e) => return errors::store_error_to_response(e),
    };

    let invoiced: i64 = invoices.iter().map(|i| i.total_cents).sum();
    let paid: i64 = invoices.iter().filter(|i| i.paid).map(|i| i.total_cents).sum();

    (
        StatusCode::OK,
        Json(json!({
            "invoiced_cents": invoiced,
            "paid_cents": paid,
            "outstanding_cents": invoiced - paid,
        })),
    )
        .into_response()
}

pub async fn create_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Json(body): Json<dto::CreateInvoiceRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ManageAllInvoices) {
        return resp;
    }

    if body.number.trim().is_empty() {
        return errors::validation_error("number", "number must not be empty");
    }
    if body.total_cents < 0 {
        return errors::validation_error("total_cents", "total must not be negative");
    }

    let invoice = Invoice {
        id: InvoiceId::new(),
        number: body.number,
        client_id: body.client_id,
        lead_id: body.lead_id,
        total_cents: body.total_cents,
        paid: false,
        internal_notes: None,
        share: None,
        created_at: Utc::now(),
    };

    // Numbers key the public share path; duplicates must never exist.
    let inserted = services
        .store
        .invoices
        .insert_unique(invoice.id, invoice.clone(), |existing| {
            existing.number == invoice.number
        });
    match inserted {
        Ok(true) => {}
        Ok(false) => {
            return errors::json_error(
                StatusCode::CONFLICT,
                "conflict",
                "an invoice with that number already exists",
            );
        }
        Err(e) => return errors::store_error_to_response(e),
    }

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::InvoiceCreate, "invoice")
            .entity(invoice.id, invoice.number.clone())
            .request(meta.ip, meta.user_agent),
    );

    (
        StatusCode::CREATED,
        Json(sanitize_invoice(invoice, principal.role)),
    )
        .into_response()
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<InvoiceId>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match load_guarded(&services, &principal, id, VIEW) {
        Ok((invoice, _)) => (
            StatusCode::OK,
            Json(sanitize_invoice(invoice, principal.role)),
        )
            .into_response(),
        Err(resp) => resp,
    }
}

pub async fn update_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<InvoiceId>,
    Json(body): Json<dto::UpdateInvoiceRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    if let Err(resp) = load_guarded(&services, &principal, id, MANAGE) {
        return resp;
    }

    let internal_notes = principal.role.is_staff().then_some(body.internal_notes).flatten();

    let updated = services.store.invoices.update(id, |invoice| {
        if let Some(paid) = body.paid {
            invoice.paid = paid;
        }
        if let Some(notes) = internal_notes {
            invoice.internal_notes = Some(notes);
        }
    });

    let invoice = match updated {
        Ok(Some(invoice)) => invoice,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::InvoiceUpdate, "invoice")
            .entity(invoice.id, invoice.number.clone())
            .request(meta.ip, meta.user_agent),
    );

    (
        StatusCode::OK,
        Json(sanitize_invoice(invoice, principal.role)),
    )
        .into_response()
}

pub async fn issue_share(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<InvoiceId>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ManageAllInvoices) {
        return resp;
    }

    let invoice = match services.store.invoices.get(id) {
        Ok(Some(invoice)) => invoice,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    let grant = ShareGrant::issue(invoice.number.clone(), Utc::now());
    if let Err(e) = services.store.invoices.update(id, |invoice| {
        invoice.share = Some(grant.clone());
    }) {
        return errors::store_error_to_response(e);
    }

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::InvoiceShare, "invoice")
            .entity(invoice.id, invoice.number.clone())
            .request(meta.ip, meta.user_agent),
    );

    (StatusCode::CREATED, Json(grant)).into_response()
}
