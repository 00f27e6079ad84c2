//! The authorization guard.
//!
//! Every guarded route resolves through the same three steps:
//!
//! 1. identity — a principal must exist and be active, else
//!    [`AccessError::Unauthenticated`];
//! 2. capability — the principal's role must hold a sufficient capability,
//!    else [`AccessError::Forbidden`];
//! 3. scope — when only the "own" variant was sufficient, the target's
//!    ownership must trace to the principal, else `Forbidden` even though the
//!    capability check passed.
//!
//! List endpoints run the same logic as a filter via [`visibility`]: "all"
//! returns the collection unfiltered, "own" returns the owned subset, and
//! neither returns an empty collection rather than an error.
//!
//! Decisions are made once per request and never cached across requests —
//! role and ownership can change between requests.
//!
//! - No IO
//! - No panics
//! - No business logic (pure policy check)

use std::collections::HashSet;

use thiserror::Error;

use fieldops_core::{ClientId, LeadId, UserId};

use crate::capability::Capability;
use crate::permissions::has_capability;
use crate::principal::Principal;

/// Authorization failure.
///
/// Maps to exactly two outward states: 401 (no valid principal) and 403
/// (valid principal, insufficient capability or ownership). The two carry
/// different retry semantics for a client and must never be conflated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl AccessError {
    fn missing(capability: Capability) -> Self {
        Self::Forbidden(format!("missing capability '{capability}'"))
    }

    fn out_of_scope(capability: Capability) -> Self {
        Self::Forbidden(format!(
            "capability '{capability}' does not extend to this record"
        ))
    }
}

/// The CRM records a principal owns, resolved per request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedRecords {
    pub client_ids: HashSet<ClientId>,
    pub lead_ids: HashSet<LeadId>,
}

impl OwnedRecords {
    /// Empty sets. An authorization check against empty ownership naturally
    /// denies, so this doubles as the fail-closed value.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.client_ids.is_empty() && self.lead_ids.is_empty()
    }
}

/// Owner fields of a candidate record, supplied by the boundary layer's
/// resource loader. The guard never fetches records itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceOwnership {
    pub client_id: Option<ClientId>,
    pub lead_id: Option<LeadId>,
    /// Direct creator (e.g. the client user who filed a service request).
    pub created_by: Option<UserId>,
    /// Directly assigned staff member (e.g. the technician on a ticket).
    pub assigned_to: Option<UserId>,
}

impl ResourceOwnership {
    /// Does this record trace to `principal_id`, directly or through the
    /// principal's owned CRM records?
    pub fn traces_to(&self, principal_id: UserId, owned: &OwnedRecords) -> bool {
        if self.created_by == Some(principal_id) || self.assigned_to == Some(principal_id) {
            return true;
        }

        if let Some(client_id) = self.client_id {
            if owned.client_ids.contains(&client_id) {
                return true;
            }
        }

        if let Some(lead_id) = self.lead_id {
            if owned.lead_ids.contains(&lead_id) {
                return true;
            }
        }

        false
    }
}

/// An own/all capability pair for one resource class and action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityPair {
    pub all: Capability,
    pub own: Capability,
}

impl CapabilityPair {
    pub const fn new(all: Capability, own: Capability) -> Self {
        Self { all, own }
    }
}

/// How far a granted capability reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    /// The "all" variant was held; no ownership filter applies.
    All,
    /// Only the "own" variant was held; ownership must still be proven.
    Own,
}

/// Visibility of a list endpoint for one principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// Unfiltered collection.
    All,
    /// Subset whose ownership resolves to the principal.
    Owned(OwnedRecords),
    /// Neither capability held: an empty collection, not an error.
    None,
}

/// Step 1: identity. The principal must be present and active.
pub fn require_active(principal: Option<&Principal>) -> Result<&Principal, AccessError> {
    match principal {
        Some(p) if p.active => Ok(p),
        // An inactive account is treated exactly like no session at all.
        _ => Err(AccessError::Unauthenticated),
    }
}

/// Step 2 for paired capabilities: which scope, if any, does the principal
/// get? "All" wins when both are held; "all" never implies "own".
pub fn check(principal: &Principal, pair: CapabilityPair) -> Result<AccessScope, AccessError> {
    if !principal.active {
        return Err(AccessError::Unauthenticated);
    }

    if has_capability(principal.role, pair.all) {
        return Ok(AccessScope::All);
    }

    if has_capability(principal.role, pair.own) {
        return Ok(AccessScope::Own);
    }

    Err(AccessError::missing(pair.own))
}

/// Step 2 for unpaired capabilities (e.g. `clients.manage`): plain allow/deny.
pub fn check_capability(principal: &Principal, capability: Capability) -> Result<(), AccessError> {
    if !principal.active {
        return Err(AccessError::Unauthenticated);
    }

    if has_capability(principal.role, capability) {
        Ok(())
    } else {
        Err(AccessError::missing(capability))
    }
}

/// Steps 2+3 against one record: `has(all) OR (has(own) AND owns(record))`.
///
/// Ownership is always required when only the "own" variant is held — there
/// is no route-specific shortcut.
pub fn check_resource(
    principal: &Principal,
    pair: CapabilityPair,
    resource: &ResourceOwnership,
    owned: &OwnedRecords,
) -> Result<(), AccessError> {
    match check(principal, pair)? {
        AccessScope::All => Ok(()),
        AccessScope::Own => {
            if resource.traces_to(principal.id, owned) {
                Ok(())
            } else {
                Err(AccessError::out_of_scope(pair.own))
            }
        }
    }
}

/// The list-endpoint filter. Callers resolve `owned` first (only needed for
/// the "own" branch) and apply the returned visibility to their collection.
pub fn visibility(principal: &Principal, pair: CapabilityPair, owned: OwnedRecords) -> Visibility {
    match check(principal, pair) {
        Ok(AccessScope::All) => Visibility::All,
        Ok(AccessScope::Own) => Visibility::Owned(owned),
        Err(_) => Visibility::None,
    }
}

/// Self-protection invariant: a principal may never deactivate or delete
/// their own account, even holding `users.manage`.
pub fn ensure_not_self(principal: &Principal, target: UserId) -> Result<(), AccessError> {
    if principal.id == target {
        return Err(AccessError::Forbidden(
            "cannot deactivate or delete your own account".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Role;

    const PROJECT_MANAGE: CapabilityPair =
        CapabilityPair::new(Capability::ManageAllProjects, Capability::ManageOwnProjects);
    const PROJECT_VIEW: CapabilityPair =
        CapabilityPair::new(Capability::ViewAllProjects, Capability::ViewOwnProjects);

    fn client_principal() -> Principal {
        Principal::new(UserId::new(), Role::Client)
    }

    fn owned_with_lead(lead: LeadId) -> OwnedRecords {
        let mut owned = OwnedRecords::empty();
        owned.lead_ids.insert(lead);
        owned
    }

    #[test]
    fn missing_principal_is_unauthenticated() {
        assert_eq!(require_active(None), Err(AccessError::Unauthenticated));
    }

    #[test]
    fn inactive_principal_is_unauthenticated_not_forbidden() {
        let mut p = Principal::new(UserId::new(), Role::Admin);
        p.active = false;

        assert_eq!(require_active(Some(&p)), Err(AccessError::Unauthenticated));
        assert_eq!(
            check(&p, PROJECT_VIEW),
            Err(AccessError::Unauthenticated)
        );
    }

    #[test]
    fn all_capability_skips_the_ownership_check() {
        let manager = Principal::new(UserId::new(), Role::Manager);
        let foreign = ResourceOwnership {
            client_id: Some(ClientId::new()),
            ..Default::default()
        };

        assert!(check_resource(&manager, PROJECT_MANAGE, &foreign, &OwnedRecords::empty()).is_ok());
    }

    #[test]
    fn own_capability_without_ownership_is_forbidden() {
        let client = client_principal();
        let foreign = ResourceOwnership {
            lead_id: Some(LeadId::new()),
            ..Default::default()
        };

        let err = check_resource(&client, PROJECT_MANAGE, &foreign, &OwnedRecords::empty());
        assert!(matches!(err, Err(AccessError::Forbidden(_))));
    }

    #[test]
    fn ownership_via_lead_trace_is_sufficient() {
        // Client C owns Lead L; project references lead_id = L.
        let client = client_principal();
        let lead = LeadId::new();
        let project = ResourceOwnership {
            lead_id: Some(lead),
            ..Default::default()
        };

        assert!(check_resource(&client, PROJECT_MANAGE, &project, &owned_with_lead(lead)).is_ok());

        // A different client with no link to L is denied on the same record.
        let other = client_principal();
        let err = check_resource(&other, PROJECT_MANAGE, &project, &OwnedRecords::empty());
        assert!(matches!(err, Err(AccessError::Forbidden(_))));
    }

    #[test]
    fn ownership_via_client_trace_is_sufficient() {
        let client = client_principal();
        let client_record = ClientId::new();
        let mut owned = OwnedRecords::empty();
        owned.client_ids.insert(client_record);

        let invoice = ResourceOwnership {
            client_id: Some(client_record),
            ..Default::default()
        };

        let pair =
            CapabilityPair::new(Capability::ViewAllInvoices, Capability::ViewOwnInvoices);
        assert!(check_resource(&client, pair, &invoice, &owned).is_ok());
    }

    #[test]
    fn direct_creator_counts_as_owner() {
        let client = client_principal();
        let request = ResourceOwnership {
            created_by: Some(client.id),
            ..Default::default()
        };

        let pair = CapabilityPair::new(
            Capability::ManageAllServiceRequests,
            Capability::ManageOwnServiceRequests,
        );
        assert!(check_resource(&client, pair, &request, &OwnedRecords::empty()).is_ok());
    }

    #[test]
    fn assigned_technician_may_act_without_a_crm_trace() {
        // Employee holds only projects.manage_own; assignment substitutes for
        // the Client/Lead trace.
        let technician = Principal::new(UserId::new(), Role::Employee);

        let unassigned = ResourceOwnership {
            assigned_to: Some(UserId::new()),
            ..Default::default()
        };
        assert!(matches!(
            check_resource(&technician, PROJECT_MANAGE, &unassigned, &OwnedRecords::empty()),
            Err(AccessError::Forbidden(_))
        ));

        let assigned = ResourceOwnership {
            assigned_to: Some(technician.id),
            ..Default::default()
        };
        assert!(
            check_resource(&technician, PROJECT_MANAGE, &assigned, &OwnedRecords::empty()).is_ok()
        );
    }

    #[test]
    fn visibility_degrades_to_empty_not_error() {
        // Employee holds neither invoice capability; dashboards expect an
        // empty list, not a 403.
        let technician = Principal::new(UserId::new(), Role::Employee);
        let pair =
            CapabilityPair::new(Capability::ViewAllInvoices, Capability::ViewOwnInvoices);

        assert_eq!(
            visibility(&technician, pair, OwnedRecords::empty()),
            Visibility::None
        );
    }

    #[test]
    fn visibility_scopes_by_held_variant() {
        let manager = Principal::new(UserId::new(), Role::Manager);
        assert_eq!(
            visibility(&manager, PROJECT_VIEW, OwnedRecords::empty()),
            Visibility::All
        );

        let client = client_principal();
        let lead = LeadId::new();
        let owned = owned_with_lead(lead);
        assert_eq!(
            visibility(&client, PROJECT_VIEW, owned.clone()),
            Visibility::Owned(owned)
        );
    }

    #[test]
    fn self_protection_holds_even_for_admin() {
        let admin = Principal::new(UserId::new(), Role::Admin);

        assert!(matches!(
            ensure_not_self(&admin, admin.id),
            Err(AccessError::Forbidden(_))
        ));
        assert!(ensure_not_self(&admin, UserId::new()).is_ok());
    }

    #[test]
    fn empty_ownership_denies_every_own_scoped_record() {
        // Fail-closed: the resolver returns empty sets on store errors, and
        // empty sets must never accidentally allow.
        let client = client_principal();
        for resource in [
            ResourceOwnership {
                client_id: Some(ClientId::new()),
                ..Default::default()
            },
            ResourceOwnership {
                lead_id: Some(LeadId::new()),
                ..Default::default()
            },
            ResourceOwnership::default(),
        ] {
            assert!(matches!(
                check_resource(&client, PROJECT_VIEW, &resource, &OwnedRecords::empty()),
                Err(AccessError::Forbidden(_))
            ));
        }
    }
}
