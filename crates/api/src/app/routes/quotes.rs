//! Quotes: CRUD, approval, and share-link issuance.

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
use fieldops_core::QuoteId;
use fieldops_crm::sanitize::sanitize_quote;
use fieldops_crm::{Quote, QuoteStatus};

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, RequestMeta};

const VIEW: CapabilityPair =
    CapabilityPair::new(Capability::ViewAllQuotes, Capability::ViewOwnQuotes);
const MANAGE: CapabilityPair =
    CapabilityPair::new(Capability::ManageAllQuotes, Capability::ManageOwnQuotes);

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_quotes).post(create_quote))
        .route("/:id", get(get_quote).patch(update_quote))
        .route("/:id/approve", post(approve_quote))
        .route("/:id/share", post(issue_share))
}

fn load_guarded(
    services: &AppServices,
    principal: &Principal,
    id: QuoteId,
    pair: CapabilityPair,
) -> Result<(Quote, AccessScope), axum::response::Response> {
    let scope = common::granted_scope(principal, pair)?;

    let quote = match services.store.quotes.get(id) {
        Ok(Some(quote)) => quote,
        Ok(None) => return Err(errors::not_found()),
        Err(e) => return Err(errors::store_error_to_response(e)),
    };

    let owned = services.owned_for(principal.id);
    common::require_in_scope(scope, principal, &quote.ownership(), &owned, pair)?;
    Ok((quote, scope))
}

pub async fn list_quotes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let quotes = match services.store.quotes.all() {
        Ok(quotes) => quotes,
        Err(e) => return errors::store_error_to_response(e),
    };

    let owned = services.owned_for(principal.id);
    let items = common::filter_visible(quotes, &principal, VIEW, owned, |q| q.ownership())
        .into_iter()
        .map(|q| sanitize_quote(q, principal.role))
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(json!({ "items": items }))).into_response()
}

pub async fn create_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Json(body): Json<dto::CreateQuoteRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    // Quote authoring is a staff action; the "own" variant only scopes
    // reads and approval, so creation requires the "all" capability.
    if let Err(resp) = common::require_capability(&principal, Capability::ManageAllQuotes) {
        return resp;
    }

    if body.number.trim().is_empty() {
        return errors::validation_error("number", "number must not be empty");
    }
    if body.total_cents < 0 {
        return errors::validation_error("total_cents", "total must not be negative");
    }

    let quote = Quote {
        id: QuoteId::new(),
        number: body.number,
        client_id: body.client_id,
        lead_id: body.lead_id,
        total_cents: body.total_cents,
        status: QuoteStatus::Draft,
        internal_notes: None,
        share: None,
        created_at: Utc::now(),
    };

    // Numbers are the lookup key for public share links; a duplicate would
    // shadow whichever record carries the grant.
    let inserted = services
        .store
        .quotes
        .insert_unique(quote.id, quote.clone(), |existing| {
            existing.number == quote.number
        });
    match inserted {
        Ok(true) => {}
        Ok(false) => {
            return errors::json_error(
                StatusCode::CONFLICT,
                "conflict",
                "a quote with that number already exists",
            );
        }
        Err(e) => return errors::store_error_to_response(e),
    }

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::QuoteCreate, "quote")
            .entity(quote.id, quote.number.clone())
            .request(meta.ip, meta.user_agent),
    );

    (
        StatusCode::CREATED,
        Json(sanitize_quote(quote, principal.role)),
    )
        .into_response()
}

pub async fn get_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<QuoteId>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match load_guarded(&services, &principal, id, VIEW) {
        Ok((quote, _)) => (
            StatusCode::OK,
            Json(sanitize_quote(quote, principal.role)),
        )
            .into_response(),
        Err(resp) => resp,
    }
}

pub async fn update_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<QuoteId>,
    Json(body): Json<dto::UpdateQuoteRequest>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    if let Err(resp) = common::require_capability(&principal, Capability::ManageAllQuotes) {
        return resp;
    }
    let quote_exists = match services.store.quotes.get(id) {
        Ok(found) => found.is_some(),
        Err(e) => return errors::store_error_to_response(e),
    };
    if !quote_exists {
        return errors::not_found();
    }

    let internal_notes = principal.role.is_staff().then_some(body.internal_notes).flatten();

    let updated = services.store.quotes.update(id, |quote| {
        if let Some(status) = body.status {
            quote.status = status;
        }
        if let Some(total) = body.total_cents {
            quote.total_cents = total;
        }
        if let Some(notes) = internal_notes {
            quote.internal_notes = Some(notes);
        }
    });

    let quote = match updated {
        Ok(Some(quote)) => quote,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::QuoteUpdate, "quote")
            .entity(quote.id, quote.number.clone())
            .request(meta.ip, meta.user_agent),
    );

    (
        StatusCode::OK,
        Json(sanitize_quote(quote, principal.role)),
    )
        .into_response()
}

/// Approval is the one quote mutation a client-role principal performs, and
/// only on quotes tracing to their own CRM records.
pub async fn approve_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<QuoteId>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let quote = match load_guarded(&services, &principal, id, MANAGE) {
        Ok((quote, _)) => quote,
        Err(resp) => return resp,
    };

    if quote.status == QuoteStatus::Declined {
        return errors::json_error(
            StatusCode::CONFLICT,
            "conflict",
            "a declined quote cannot be approved",
        );
    }

    let updated = services.store.quotes.update(id, |quote| {
        quote.status = QuoteStatus::Approved;
    });
    let quote = match updated {
        Ok(Some(quote)) => quote,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::QuoteApprove, "quote")
            .entity(quote.id, quote.number.clone())
            .request(meta.ip, meta.user_agent),
    );

    (
        StatusCode::OK,
        Json(sanitize_quote(quote, principal.role)),
    )
        .into_response()
}

pub async fn issue_share(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Extension(meta): Extension<RequestMeta>,
    Path(id): Path<QuoteId>,
) -> axum::response::Response {
    let principal = match common::authenticated(&ctx) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if let Err(resp) = common::require_capability(&principal, Capability::ManageAllQuotes) {
        return resp;
    }

    let quote = match services.store.quotes.get(id) {
        Ok(Some(quote)) => quote,
        Ok(None) => return errors::not_found(),
        Err(e) => return errors::store_error_to_response(e),
    };

    let grant = ShareGrant::issue(quote.number.clone(), Utc::now());
    if let Err(e) = services.store.quotes.update(id, |quote| {
        quote.share = Some(grant.clone());
    }) {
        return errors::store_error_to_response(e);
    }

    services.record_audit(
        AuditEntry::new(Some(principal.id), AuditAction::QuoteShare, "quote")
            .entity(quote.id, quote.number.clone())
            .request(meta.ip, meta.user_agent),
    );

    (StatusCode::CREATED, Json(grant)).into_response()
}
