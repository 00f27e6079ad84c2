//! The role→capability matrix.
//!
//! This is **authored data, not computed policy**: each role's capability set
//! is a static slice, immutable at runtime, changed only by deployment. The
//! lookup is total — every (role, capability) pair has an answer, and pairs
//! not listed are `false` (closed world), never an error.
//!
//! The table never encodes "all implies own". Where a route accepts either
//! variant of a pair, the guard composes
//! `has(all) OR (has(own) AND is_owner)` — see [`crate::guard`].

use crate::capability::Capability;
use crate::roles::Role;

const CLIENT: &[Capability] = &[
    Capability::ViewOwnServiceRequests,
    Capability::ManageOwnServiceRequests,
    Capability::ViewOwnProjects,
    Capability::ManageOwnProjects,
    Capability::ViewOwnQuotes,
    Capability::ManageOwnQuotes,
    Capability::ViewOwnInvoices,
    Capability::ViewOwnTickets,
    Capability::ManageOwnTickets,
];

const EMPLOYEE: &[Capability] = &[
    Capability::ViewOwnServiceRequests,
    Capability::ManageOwnServiceRequests,
    Capability::ViewOwnProjects,
    Capability::ManageOwnProjects,
    Capability::ViewOwnTickets,
    Capability::ManageOwnTickets,
    Capability::ViewInventory,
];

const SALES: &[Capability] = &[
    Capability::ViewClients,
    Capability::ManageClients,
    Capability::ViewLeads,
    Capability::ManageLeads,
    Capability::ViewOwnQuotes,
    Capability::ManageOwnQuotes,
    Capability::ViewAllQuotes,
    Capability::ManageAllQuotes,
    Capability::ViewAllServiceRequests,
    Capability::ViewAllProjects,
    Capability::ViewFinancial,
];

const PROJECT_MANAGER: &[Capability] = &[
    Capability::ViewOwnProjects,
    Capability::ManageOwnProjects,
    Capability::ViewAllProjects,
    Capability::ManageAllProjects,
    Capability::ViewAllTickets,
    Capability::ManageAllTickets,
    Capability::ViewAllServiceRequests,
    Capability::ManageAllServiceRequests,
    Capability::ViewAllQuotes,
    Capability::ViewClients,
    Capability::ViewLeads,
    Capability::ViewUsers,
    Capability::ViewInventory,
];

const MANAGER: &[Capability] = &[
    Capability::ViewAllServiceRequests,
    Capability::ManageAllServiceRequests,
    Capability::ViewAllProjects,
    Capability::ManageAllProjects,
    Capability::ViewAllQuotes,
    Capability::ManageAllQuotes,
    Capability::ViewAllInvoices,
    Capability::ManageAllInvoices,
    Capability::ViewAllTickets,
    Capability::ManageAllTickets,
    Capability::ViewClients,
    Capability::ManageClients,
    Capability::ViewLeads,
    Capability::ManageLeads,
    Capability::ViewUsers,
    Capability::ManageUsers,
    Capability::ViewInventory,
    Capability::ManageInventory,
    Capability::ViewFinancial,
];

const ADMIN: &[Capability] = &Capability::ALL;

/// The capability set granted to `role`.
pub fn role_capabilities(role: Role) -> &'static [Capability] {
    match role {
        Role::Client => CLIENT,
        Role::Employee => EMPLOYEE,
        Role::Sales => SALES,
        Role::ProjectManager => PROJECT_MANAGER,
        Role::Manager => MANAGER,
        Role::Admin => ADMIN,
    }
}

/// Total lookup: does `role` hold `capability`?
pub fn has_capability(role: Role, capability: Capability) -> bool {
    role_capabilities(role).contains(&capability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn lookup_is_total_and_closed_world() {
        // Every pair answers; pairs outside the authored slice are false.
        for role in Role::ALL {
            let granted: HashSet<Capability> =
                role_capabilities(role).iter().copied().collect();
            for cap in Capability::ALL {
                assert_eq!(has_capability(role, cap), granted.contains(&cap));
            }
        }
    }

    #[test]
    fn admin_holds_everything() {
        for cap in Capability::ALL {
            assert!(has_capability(Role::Admin, cap));
        }
    }

    #[test]
    fn client_never_holds_an_all_capability() {
        for cap in [
            Capability::ViewAllServiceRequests,
            Capability::ViewAllProjects,
            Capability::ViewAllQuotes,
            Capability::ViewAllInvoices,
            Capability::ViewAllTickets,
            Capability::ManageAllProjects,
            Capability::ManageUsers,
            Capability::ViewFinancial,
        ] {
            assert!(!has_capability(Role::Client, cap));
        }
    }

    #[test]
    fn all_and_own_stay_distinct_in_the_table() {
        // Manager acts through "all" capabilities and deliberately holds no
        // "own" project capability; the table must not conflate the pair.
        assert!(has_capability(Role::Manager, Capability::ManageAllProjects));
        assert!(!has_capability(Role::Manager, Capability::ManageOwnProjects));

        // Employee is the inverse: "own" only.
        assert!(has_capability(Role::Employee, Capability::ManageOwnProjects));
        assert!(!has_capability(Role::Employee, Capability::ManageAllProjects));
    }

    #[test]
    fn employee_cannot_touch_financials_or_users() {
        assert!(!has_capability(Role::Employee, Capability::ViewFinancial));
        assert!(!has_capability(Role::Employee, Capability::ManageUsers));
        assert!(!has_capability(Role::Employee, Capability::ViewUsers));
    }

    proptest! {
        /// The lookup is a pure function of its inputs: asking twice never
        /// changes the answer (the table is data, not state).
        #[test]
        fn lookup_is_stable(role_ix in 0usize..Role::ALL.len(),
                            cap_ix in 0usize..Capability::ALL.len()) {
            let role = Role::ALL[role_ix];
            let cap = Capability::ALL[cap_ix];
            prop_assert_eq!(has_capability(role, cap), has_capability(role, cap));
        }
    }
}
