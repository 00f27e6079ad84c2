//! Shared guard plumbing for route handlers.
//!
//! Every handler runs the same sequence: resolve the principal from the
//! request extension, run the capability (and, where applicable, ownership)
//! check, and only then touch storage. Existence is checked after
//! authorization so a 404 never reveals a record the caller could not see.

use axum::response::Response;

use fieldops_auth::{
    check, check_capability, visibility, AccessScope, Capability, CapabilityPair, OwnedRecords,
    Principal, ResourceOwnership, Visibility,
};

use crate::app::errors;
use crate::context::PrincipalContext;

/// Step 1: an active principal, or the 401 response.
pub fn authenticated(ctx: &PrincipalContext) -> Result<Principal, Response> {
    fieldops_auth::require_active(ctx.principal())
        .map(|p| *p)
        .map_err(errors::access_error_to_response)
}

/// Step 2 for an own/all pair: the granted scope, or the 403 response.
pub fn granted_scope(principal: &Principal, pair: CapabilityPair) -> Result<AccessScope, Response> {
    check(principal, pair).map_err(errors::access_error_to_response)
}

/// Step 2 for an unscoped capability.
pub fn require_capability(principal: &Principal, capability: Capability) -> Result<(), Response> {
    check_capability(principal, capability).map_err(errors::access_error_to_response)
}

/// Step 3: with `Own` scope, the record must trace to the principal.
pub fn require_in_scope(
    scope: AccessScope,
    principal: &Principal,
    ownership: &ResourceOwnership,
    owned: &OwnedRecords,
    pair: CapabilityPair,
) -> Result<(), Response> {
    match scope {
        AccessScope::All => Ok(()),
        AccessScope::Own => {
            if ownership.traces_to(principal.id, owned) {
                Ok(())
            } else {
                Err(errors::access_error_to_response(
                    fieldops_auth::AccessError::Forbidden(format!(
                        "capability '{}' does not extend to this record",
                        pair.own
                    )),
                ))
            }
        }
    }
}

/// The list filter: "all" passes everything through, "own" keeps records
/// tracing to the principal, neither yields an empty collection.
pub fn filter_visible<T>(
    items: Vec<T>,
    principal: &Principal,
    pair: CapabilityPair,
    owned: OwnedRecords,
    ownership: impl Fn(&T) -> ResourceOwnership,
) -> Vec<T> {
    match visibility(principal, pair, owned) {
        Visibility::All => items,
        Visibility::Owned(owned) => items
            .into_iter()
            .filter(|record| ownership(record).traces_to(principal.id, &owned))
            .collect(),
        Visibility::None => Vec::new(),
    }
}
